use std::sync::Arc;

use thiserror::Error;

use threadcart_catalog::ProductCatalog;
use threadcart_core::{CustomerId, DomainError, ProductId, Size};
use threadcart_inventory::{StockKey, StockLedger};

use crate::line::{CartLine, CartSnapshot, SnapshotLine};
use crate::store::CartStore;

/// Failures surfaced by cart line edits.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("unknown product: {0}")]
    UnknownProduct(ProductId),

    #[error("product {product_id} does not come in size {size}")]
    InvalidSize { product_id: ProductId, size: Size },

    /// The advisory bound check failed: the requested quantity plus what
    /// other carts already hold exceeds the available snapshot.
    #[error(
        "insufficient stock: requested {requested}, available {available}, reserved elsewhere {reserved_elsewhere}"
    )]
    InsufficientStock {
        requested: u64,
        available: u64,
        reserved_elsewhere: u64,
    },

    #[error(transparent)]
    Store(#[from] DomainError),
}

/// Cart mutation with the advisory stock bound.
///
/// The bound check here rejects obviously-oversized requests early for UX;
/// it reserves nothing. Stock may still drop below a held quantity before
/// checkout, and checkout is the final authority on that discrepancy.
pub struct CartService {
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockLedger>,
    carts: Arc<dyn CartStore>,
}

impl CartService {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockLedger>,
        carts: Arc<dyn CartStore>,
    ) -> Self {
        Self {
            catalog,
            stock,
            carts,
        }
    }

    /// Create or replace the (customer, product, size) line.
    pub async fn set_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: Size,
        quantity: u32,
    ) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::Validation(
                "quantity must be positive; use remove_line to drop a line".to_string(),
            ));
        }

        let product = self
            .catalog
            .get(product_id)
            .await?
            .ok_or(CartError::UnknownProduct(product_id))?;
        if !product.has_size(&size) {
            return Err(CartError::InvalidSize { product_id, size });
        }

        let key = StockKey::new(product_id, size.clone());
        let available = self
            .stock
            .get_available(product_id)
            .await?
            .get(&size)
            .copied()
            .unwrap_or(0);
        let reserved_elsewhere = self.carts.reserved_elsewhere(&key, customer_id).await?;

        // Advisory check only: counts the requester's line as replaced, and
        // holds no stock. The snapshot may be stale by the time we commit.
        if u64::from(quantity) + reserved_elsewhere > available {
            return Err(CartError::InsufficientStock {
                requested: u64::from(quantity),
                available,
                reserved_elsewhere,
            });
        }

        self.carts
            .put_line(CartLine {
                customer_id,
                product_id,
                size,
                quantity,
            })
            .await?;
        Ok(())
    }

    pub async fn remove_line(
        &self,
        customer_id: CustomerId,
        product_id: ProductId,
        size: &Size,
    ) -> Result<(), CartError> {
        self.carts.remove_line(customer_id, product_id, size).await?;
        Ok(())
    }

    pub async fn clear(&self, customer_id: CustomerId) -> Result<(), CartError> {
        self.carts.clear(customer_id).await?;
        Ok(())
    }

    pub async fn lines(&self, customer_id: CustomerId) -> Result<Vec<CartLine>, CartError> {
        Ok(self.carts.lines(customer_id).await?)
    }

    /// Freeze the customer's current cart for checkout submission.
    pub async fn snapshot(&self, customer_id: CustomerId) -> Result<CartSnapshot, CartError> {
        let lines = self
            .carts
            .lines(customer_id)
            .await?
            .into_iter()
            .map(|l| SnapshotLine {
                product_id: l.product_id,
                size: l.size,
                quantity: l.quantity,
            })
            .collect();
        Ok(CartSnapshot::new(customer_id, lines))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::sync::RwLock;

    use async_trait::async_trait;
    use threadcart_catalog::Product;
    use threadcart_core::DomainResult;
    use threadcart_inventory::DecrementOutcome;

    use super::*;

    #[derive(Default)]
    struct FakeCatalog {
        products: RwLock<HashMap<ProductId, Product>>,
    }

    #[async_trait]
    impl ProductCatalog for FakeCatalog {
        async fn get(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
            Ok(self.products.read().unwrap().get(&product_id).cloned())
        }

        async fn list(&self) -> DomainResult<Vec<Product>> {
            Ok(self.products.read().unwrap().values().cloned().collect())
        }

        async fn upsert(&self, product: Product) -> DomainResult<()> {
            self.products
                .write()
                .unwrap()
                .insert(product.id_typed(), product);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeStock {
        counts: RwLock<HashMap<StockKey, u64>>,
    }

    #[async_trait]
    impl StockLedger for FakeStock {
        async fn get_available(
            &self,
            product_id: ProductId,
        ) -> DomainResult<BTreeMap<Size, u64>> {
            Ok(self
                .counts
                .read()
                .unwrap()
                .iter()
                .filter(|(k, _)| k.product_id == product_id)
                .map(|(k, v)| (k.size.clone(), *v))
                .collect())
        }

        async fn try_decrement(
            &self,
            _key: &StockKey,
            _amount: u64,
        ) -> DomainResult<DecrementOutcome> {
            unreachable!("cart never decrements stock")
        }

        async fn increment(&self, _key: &StockKey, _amount: u64) -> DomainResult<()> {
            unreachable!("cart never increments stock")
        }

        async fn set_quantity(&self, key: &StockKey, quantity: u64) -> DomainResult<()> {
            self.counts.write().unwrap().insert(key.clone(), quantity);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeCarts {
        lines: RwLock<HashMap<(CustomerId, ProductId, Size), u32>>,
    }

    #[async_trait]
    impl CartStore for FakeCarts {
        async fn line(
            &self,
            customer_id: CustomerId,
            product_id: ProductId,
            size: &Size,
        ) -> DomainResult<Option<CartLine>> {
            Ok(self
                .lines
                .read()
                .unwrap()
                .get(&(customer_id, product_id, size.clone()))
                .map(|q| CartLine {
                    customer_id,
                    product_id,
                    size: size.clone(),
                    quantity: *q,
                }))
        }

        async fn put_line(&self, line: CartLine) -> DomainResult<()> {
            self.lines.write().unwrap().insert(
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
            self.lines
                .write()
                .unwrap()
                .remove(&(customer_id, product_id, size.clone()));
            Ok(())
        }

        async fn clear(&self, customer_id: CustomerId) -> DomainResult<()> {
            self.lines
                .write()
                .unwrap()
                .retain(|(c, _, _), _| *c != customer_id);
            Ok(())
        }

        async fn lines(&self, customer_id: CustomerId) -> DomainResult<Vec<CartLine>> {
            Ok(self
                .lines
                .read()
                .unwrap()
                .iter()
                .filter(|((c, _, _), _)| *c == customer_id)
                .map(|((c, p, s), q)| CartLine {
                    customer_id: *c,
                    product_id: *p,
                    size: s.clone(),
                    quantity: *q,
                })
                .collect())
        }

        async fn reserved_elsewhere(
            &self,
            key: &StockKey,
            excluding: CustomerId,
        ) -> DomainResult<u64> {
            Ok(self
                .lines
                .read()
                .unwrap()
                .iter()
                .filter(|((c, p, s), _)| {
                    *c != excluding && *p == key.product_id && *s == key.size
                })
                .map(|(_, q)| u64::from(*q))
                .sum())
        }
    }

    struct Fixture {
        service: CartService,
        stock: Arc<FakeStock>,
        product_id: ProductId,
    }

    async fn fixture(available: u64) -> Fixture {
        let catalog = Arc::new(FakeCatalog::default());
        let stock = Arc::new(FakeStock::default());
        let carts = Arc::new(FakeCarts::default());

        let product_id = ProductId::new();
        let product = Product::new(
            product_id,
            "Runner",
            "black",
            vec![Size::new("41").unwrap(), Size::new("42").unwrap()],
            8995,
        )
        .unwrap();
        catalog.upsert(product).await.unwrap();
        stock
            .set_quantity(&StockKey::new(product_id, Size::new("42").unwrap()), available)
            .await
            .unwrap();

        Fixture {
            service: CartService::new(catalog, stock.clone(), carts),
            stock,
            product_id,
        }
    }

    #[tokio::test]
    async fn set_line_accepts_within_available_stock() {
        let fx = fixture(5).await;
        let customer = CustomerId::new();

        fx.service
            .set_line(customer, fx.product_id, Size::new("42").unwrap(), 3)
            .await
            .unwrap();

        let lines = fx.service.lines(customer).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 3);
    }

    #[tokio::test]
    async fn set_line_rejects_when_other_carts_reserve_the_rest() {
        let fx = fixture(5).await;
        let size = Size::new("42").unwrap();
        let first = CustomerId::new();
        let second = CustomerId::new();

        fx.service
            .set_line(first, fx.product_id, size.clone(), 3)
            .await
            .unwrap();

        let err = fx
            .service
            .set_line(second, fx.product_id, size, 3)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                requested: 3,
                available: 5,
                reserved_elsewhere: 3,
            }
        );
    }

    #[tokio::test]
    async fn set_line_replaces_own_reservation_rather_than_stacking() {
        let fx = fixture(5).await;
        let size = Size::new("42").unwrap();
        let customer = CustomerId::new();

        fx.service
            .set_line(customer, fx.product_id, size.clone(), 4)
            .await
            .unwrap();
        // Editing the same line down to 5 is within stock; the old quantity
        // does not count against the customer's own edit.
        fx.service
            .set_line(customer, fx.product_id, size, 5)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn set_line_rejects_unknown_product_and_size() {
        let fx = fixture(5).await;
        let customer = CustomerId::new();

        let err = fx
            .service
            .set_line(customer, ProductId::new(), Size::new("42").unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UnknownProduct(_)));

        let err = fx
            .service
            .set_line(customer, fx.product_id, Size::new("39").unwrap(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::InvalidSize { .. }));
    }

    #[tokio::test]
    async fn cart_does_not_auto_correct_when_stock_drops() {
        let fx = fixture(5).await;
        let size = Size::new("42").unwrap();
        let customer = CustomerId::new();

        fx.service
            .set_line(customer, fx.product_id, size.clone(), 5)
            .await
            .unwrap();

        // Another customer checked out; stock dropped under the held quantity.
        fx.stock
            .set_quantity(&StockKey::new(fx.product_id, size), 2)
            .await
            .unwrap();

        let lines = fx.service.lines(customer).await.unwrap();
        assert_eq!(lines[0].quantity, 5, "cart keeps the stale quantity");
    }

    #[tokio::test]
    async fn snapshot_is_sorted_and_hashable() {
        let fx = fixture(10).await;
        let customer = CustomerId::new();
        fx.stock
            .set_quantity(&StockKey::new(fx.product_id, Size::new("41").unwrap()), 10)
            .await
            .unwrap();

        fx.service
            .set_line(customer, fx.product_id, Size::new("42").unwrap(), 2)
            .await
            .unwrap();
        fx.service
            .set_line(customer, fx.product_id, Size::new("41").unwrap(), 1)
            .await
            .unwrap();

        let snapshot = fx.service.snapshot(customer).await.unwrap();
        assert_eq!(snapshot.lines.len(), 2);
        assert_eq!(snapshot.lines[0].size.as_str(), "41");
        assert_eq!(snapshot.stable_hash(), fx.service.snapshot(customer).await.unwrap().stable_hash());
    }
}
