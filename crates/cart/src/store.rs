use async_trait::async_trait;

use threadcart_core::{CustomerId, DomainResult, ProductId, Size};
use threadcart_inventory::StockKey;

use crate::line::CartLine;

/// Storage for pending cart lines.
///
/// Entries are owned and mutable only by their customer; the one cross-cart
/// read is `reserved_elsewhere`, which the advisory bound check uses to
/// count what other carts already claim for a key.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: &Size,
    ) -> DomainResult<Option<CartLine>>;

    /// Insert or replace a line. Quantity must already be validated (>= 1).
    async fn put_line(&self, line: CartLine) -> DomainResult<()>;

    async fn remove_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: &Size,
    ) -> DomainResult<()>;

    async fn clear(&self, customer_id: CustomerId) -> DomainResult<()>;

    async fn lines(&self, customer_id: CustomerId) -> DomainResult<Vec<CartLine>>;

    /// Sum of quantities held for `key` across all carts except `excluding`.
    async fn reserved_elsewhere(
        &self,
        key: &StockKey,
        excluding: CustomerId,
    ) -> DomainResult<u64>;
}
