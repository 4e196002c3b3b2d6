use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use threadcart_catalog::{Product, ProductCatalog};
use threadcart_core::{DomainError, DomainResult, ProductId};

/// In-memory product catalog.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn get(&self, product_id: ProductId) -> DomainResult<Option<Product>> {
        Ok(self
            .products
            .read()
            .map_err(|_| DomainError::store_unavailable("catalog lock poisoned"))?
            .get(&product_id)
            .cloned())
    }

    async fn list(&self) -> DomainResult<Vec<Product>> {
        let products = self
            .products
            .read()
            .map_err(|_| DomainError::store_unavailable("catalog lock poisoned"))?;
        let mut listed: Vec<Product> = products.values().cloned().collect();
        listed.sort_by(|a, b| a.name().cmp(b.name()));
        Ok(listed)
    }

    async fn upsert(&self, product: Product) -> DomainResult<()> {
        self.products
            .write()
            .map_err(|_| DomainError::store_unavailable("catalog lock poisoned"))?
            .insert(product.id_typed(), product);
        Ok(())
    }
}
