use async_trait::async_trait;

use threadcart_core::{CustomerId, DomainResult, OrderId};

use crate::order::Order;

/// Persistence for placed orders.
///
/// Mutation goes through narrow status operations rather than a generic
/// `update(Order)`: lines and money never change after insert.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert a newly placed order. Duplicate ids are a `Conflict`.
    async fn insert(&self, order: Order) -> DomainResult<()>;

    async fn get(&self, order_id: OrderId) -> DomainResult<Option<Order>>;

    async fn confirm(&self, order_id: OrderId) -> DomainResult<()>;

    async fn cancel(&self, order_id: OrderId, reason: &str) -> DomainResult<()>;

    async fn flag_voucher_discrepancy(&self, order_id: OrderId) -> DomainResult<()>;

    async fn mark_shipped(&self, order_id: OrderId) -> DomainResult<()>;

    async fn mark_delivered(&self, order_id: OrderId) -> DomainResult<()>;

    /// Newest first.
    async fn list_for_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>>;
}
