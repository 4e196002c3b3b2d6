use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use threadcart_cart::{CartLine, CartStore};
use threadcart_core::{CustomerId, DomainError, DomainResult, ProductId, Size};
use threadcart_inventory::StockKey;

type LineKey = (CustomerId, ProductId, Size);

/// In-memory cart lines. A plain map under one lock is enough here; carts
/// are advisory and never sit on the contended checkout path.
#[derive(Default)]
pub struct InMemoryCartStore {
    lines: RwLock<HashMap<LineKey, u32>>,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<std::sync::RwLockReadGuard<'_, HashMap<LineKey, u32>>> {
        self.lines
            .read()
            .map_err(|_| DomainError::store_unavailable("cart lock poisoned"))
    }

    fn write(&self) -> DomainResult<std::sync::RwLockWriteGuard<'_, HashMap<LineKey, u32>>> {
        self.lines
            .write()
            .map_err(|_| DomainError::store_unavailable("cart lock poisoned"))
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: &Size,
    ) -> DomainResult<Option<CartLine>> {
        Ok(self
            .read()?
            .get(&(customer_id, product_id, size.clone()))
            .map(|quantity| CartLine {
                customer_id,
                product_id,
                size: size.clone(),
                quantity: *quantity,
            }))
    }

    async fn put_line(&self, line: CartLine) -> DomainResult<()> {
        if line.quantity == 0 {
            return Err(DomainError::validation("cart line quantity must be positive"));
        }
        self.write()?.insert(
            (line.customer_id, line.product_id, line.size),
            line.quantity,
        );
        Ok(())
    }

    async fn remove_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: &Size,
    ) -> DomainResult<()> {
        self.write()?.remove(&(customer_id, product_id, size.clone()));
        Ok(())
    }

    async fn clear(&self, customer_id: CustomerId) -> DomainResult<()> {
        self.write()?.retain(|(c, _, _), _| *c != customer_id);
        Ok(())
    }

    async fn lines(&self, customer_id: CustomerId) -> DomainResult<Vec<CartLine>> {
        Ok(self
            .read()?
            .iter()
            .filter(|((c, _, _), _)| *c == customer_id)
            .map(|((c, p, s), quantity)| CartLine {
                customer_id: *c,
                product_id: *p,
                size: s.clone(),
                quantity: *quantity,
            })
            .collect())
    }

    async fn reserved_elsewhere(
        &self,
        key: &StockKey,
        excluding: CustomerId,
    ) -> DomainResult<u64> {
        Ok(self
            .read()?
            .iter()
            .filter(|((c, p, s), _)| {
                *c != excluding && *p == key.product_id && *s == key.size
            })
            .map(|(_, quantity)| u64::from(*quantity))
            .sum())
    }
}
