use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use threadcart_core::{DomainError, DomainResult, ProductId, Size};

/// Ledger key: one counter per (product, size).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StockKey {
    pub product_id: ProductId,
    pub size: Size,
}

impl StockKey {
    pub fn new(product_id: ProductId, size: Size) -> Self {
        Self { product_id, size }
    }
}

impl core::fmt::Display for StockKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.product_id, self.size)
    }
}

/// Result of a conditional decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DecrementOutcome {
    /// The quantity was decremented; it never went below zero.
    Committed,
    /// The available quantity was smaller than the requested amount; no-op.
    Insufficient { available: u64 },
}

/// Per-key stock counters. The authoritative gate against overselling.
///
/// Implementations must serialize access **per key**, not globally: two
/// checkouts for different products must never block each other. For a fixed
/// key, concurrent `try_decrement` calls are linearizable — exactly as many
/// succeed as the available quantity allows.
#[async_trait]
pub trait StockLedger: Send + Sync {
    /// Read-only snapshot of a product's availability across sizes.
    ///
    /// May be stale the moment it returns; advisory for UI/cart checks only.
    async fn get_available(&self, product_id: ProductId) -> DomainResult<BTreeMap<Size, u64>>;

    /// Atomic conditional decrement: succeeds only if `quantity - amount >= 0`,
    /// otherwise leaves the counter untouched and reports `Insufficient`.
    async fn try_decrement(&self, key: &StockKey, amount: u64) -> DomainResult<DecrementOutcome>;

    /// Atomic increment. Used only for compensation (checkout rollback,
    /// order cancellation) and receiving.
    async fn increment(&self, key: &StockKey, amount: u64) -> DomainResult<()>;

    /// Seeding/receiving surface: overwrite a counter.
    async fn set_quantity(&self, key: &StockKey, quantity: u64) -> DomainResult<()>;
}

/// Shared guard: zero-amount mutations are malformed requests, not no-ops.
pub fn guard_amount(amount: u64) -> DomainResult<()> {
    if amount == 0 {
        return Err(DomainError::validation("amount must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_amount_rejects_zero() {
        assert!(matches!(
            guard_amount(0).unwrap_err(),
            DomainError::Validation(_)
        ));
        assert!(guard_amount(1).is_ok());
    }

    #[test]
    fn stock_key_display_is_product_slash_size() {
        let key = StockKey::new(ProductId::new(), Size::new("42").unwrap());
        let rendered = key.to_string();
        assert!(rendered.ends_with("/42"));
    }
}
