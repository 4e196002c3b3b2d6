use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use threadcart_core::{CustomerId, DomainError, DomainResult, OrderId};
use threadcart_orders::{Order, OrderStore};

/// In-memory order store. Status transitions go through the domain methods
/// so the same invariants hold as against a durable backend.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_order<R>(
        &self,
        order_id: OrderId,
        mutate: impl FnOnce(&mut Order) -> DomainResult<R>,
    ) -> DomainResult<R> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::store_unavailable("order lock poisoned"))?;
        let order = orders.get_mut(&order_id).ok_or(DomainError::NotFound)?;
        mutate(order)
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: Order) -> DomainResult<()> {
        let mut orders = self
            .orders
            .write()
            .map_err(|_| DomainError::store_unavailable("order lock poisoned"))?;
        if orders.contains_key(&order.id()) {
            return Err(DomainError::conflict(format!(
                "order {} already exists",
                order.id()
            )));
        }
        orders.insert(order.id(), order);
        Ok(())
    }

    async fn get(&self, order_id: OrderId) -> DomainResult<Option<Order>> {
        Ok(self
            .orders
            .read()
            .map_err(|_| DomainError::store_unavailable("order lock poisoned"))?
            .get(&order_id)
            .cloned())
    }

    async fn confirm(&self, order_id: OrderId) -> DomainResult<()> {
        self.with_order(order_id, Order::confirm)
    }

    async fn cancel(&self, order_id: OrderId, reason: &str) -> DomainResult<()> {
        self.with_order(order_id, |order| order.cancel(reason))
    }

    async fn flag_voucher_discrepancy(&self, order_id: OrderId) -> DomainResult<()> {
        self.with_order(order_id, |order| {
            order.flag_voucher_discrepancy();
            Ok(())
        })
    }

    async fn mark_shipped(&self, order_id: OrderId) -> DomainResult<()> {
        self.with_order(order_id, Order::mark_shipped)
    }

    async fn mark_delivered(&self, order_id: OrderId) -> DomainResult<()> {
        self.with_order(order_id, Order::mark_delivered)
    }

    async fn list_for_customer(&self, customer_id: CustomerId) -> DomainResult<Vec<Order>> {
        let orders = self
            .orders
            .read()
            .map_err(|_| DomainError::store_unavailable("order lock poisoned"))?;
        let mut result: Vec<Order> = orders
            .values()
            .filter(|order| order.customer_id() == customer_id)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use threadcart_core::{ProductId, Size};
    use threadcart_orders::{NewOrder, OrderLine, OrderStatus, PricingBreakdown};

    use super::*;

    fn test_order(customer_id: CustomerId) -> Order {
        Order::place(NewOrder {
            id: OrderId::new(),
            customer_id,
            lines: vec![OrderLine {
                product_id: ProductId::new(),
                size: Size::new("42").unwrap(),
                quantity: 1,
                unit_price_cents: 8995,
            }],
            payment_reference: "auth-1".to_string(),
            voucher_code: None,
            pricing: PricingBreakdown {
                subtotal_cents: 8995,
                shipping_fee_cents: 495,
                discount_cents: 0,
                total_cents: 9490,
            },
            placed_at: Utc::now(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn duplicate_insert_is_a_conflict() {
        let store = InMemoryOrderStore::new();
        let order = test_order(CustomerId::new());
        store.insert(order.clone()).await.unwrap();
        assert!(matches!(
            store.insert(order).await.unwrap_err(),
            DomainError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn transitions_apply_through_domain_invariants() {
        let store = InMemoryOrderStore::new();
        let order = test_order(CustomerId::new());
        let order_id = order.id();
        store.insert(order).await.unwrap();

        // Unconfirmed orders cannot ship.
        assert!(store.mark_shipped(order_id).await.is_err());

        store.confirm(order_id).await.unwrap();
        store.mark_shipped(order_id).await.unwrap();
        store.mark_delivered(order_id).await.unwrap();
        assert_eq!(
            store.get(order_id).await.unwrap().unwrap().status(),
            OrderStatus::Delivered
        );
    }

    #[tokio::test]
    async fn listing_is_scoped_to_the_customer_newest_first() {
        let store = InMemoryOrderStore::new();
        let me = CustomerId::new();
        let first = test_order(me);
        let second = test_order(me);
        store.insert(first.clone()).await.unwrap();
        store.insert(second.clone()).await.unwrap();
        store.insert(test_order(CustomerId::new())).await.unwrap();

        let listed = store.list_for_customer(me).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at() >= listed[1].created_at());
    }
}
