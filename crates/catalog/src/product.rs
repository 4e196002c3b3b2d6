use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use threadcart_core::{DomainError, DomainResult, Entity, ProductId, Size};

/// A sellable product: identity, size run, color, unit price.
///
/// Products are immutable during checkout; prices observed at pricing time
/// are copied onto order lines and never re-read afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    color: String,
    sizes: Vec<Size>,
    /// Price in smallest currency unit (e.g., cents).
    unit_price_cents: u64,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        color: impl Into<String>,
        sizes: Vec<Size>,
        unit_price_cents: u64,
    ) -> DomainResult<Self> {
        let name = name.into();
        let color = color.into();

        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if sizes.is_empty() {
            return Err(DomainError::validation(
                "product must carry at least one size",
            ));
        }
        if unit_price_cents == 0 {
            return Err(DomainError::validation("unit_price must be positive"));
        }

        let mut sizes = sizes;
        sizes.sort();
        sizes.dedup();

        Ok(Self {
            id,
            name,
            color,
            sizes,
            unit_price_cents,
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn sizes(&self) -> &[Size] {
        &self.sizes
    }

    pub fn unit_price_cents(&self) -> u64 {
        self.unit_price_cents
    }

    pub fn has_size(&self, size: &Size) -> bool {
        self.sizes.contains(size)
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Read-only product lookup consumed by cart and checkout.
///
/// `upsert` exists for seeding/admin wiring; the reservation core itself
/// never writes products.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get(&self, product_id: ProductId) -> DomainResult<Option<Product>>;

    async fn list(&self) -> DomainResult<Vec<Product>>;

    async fn upsert(&self, product: Product) -> DomainResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_sizes() -> Vec<Size> {
        vec![Size::new("41").unwrap(), Size::new("42").unwrap()]
    }

    #[test]
    fn new_product_sorts_and_dedups_sizes() {
        let sizes = vec![
            Size::new("44").unwrap(),
            Size::new("41").unwrap(),
            Size::new("44").unwrap(),
        ];
        let product = Product::new(ProductId::new(), "Runner", "black", sizes, 8995).unwrap();
        let labels: Vec<&str> = product.sizes().iter().map(Size::as_str).collect();
        assert_eq!(labels, vec!["41", "44"]);
    }

    #[test]
    fn rejects_empty_name() {
        let err = Product::new(ProductId::new(), "  ", "black", test_sizes(), 8995).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_empty_size_run() {
        let err = Product::new(ProductId::new(), "Runner", "black", vec![], 8995).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_zero_price() {
        let err = Product::new(ProductId::new(), "Runner", "black", test_sizes(), 0).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn has_size_matches_size_run_only() {
        let product = Product::new(ProductId::new(), "Runner", "black", test_sizes(), 8995).unwrap();
        assert!(product.has_size(&Size::new("41").unwrap()));
        assert!(!product.has_size(&Size::new("39").unwrap()));
    }
}
