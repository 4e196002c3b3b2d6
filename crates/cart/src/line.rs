use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use threadcart_core::{CustomerId, ProductId, Size};

/// One pending line in a customer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub customer_id: CustomerId,
    pub product_id: ProductId,
    pub size: Size,
    /// Always >= 1; a zero-quantity line is removed, not stored.
    pub quantity: u32,
}

/// One line of a frozen cart snapshot handed to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotLine {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
}

/// The cart contents a checkout attempt was submitted with.
///
/// Lines are sorted by (product, size) so that two snapshots of the same
/// cart hash identically regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub customer_id: CustomerId,
    pub lines: Vec<SnapshotLine>,
}

impl CartSnapshot {
    pub fn new(customer_id: CustomerId, mut lines: Vec<SnapshotLine>) -> Self {
        lines.sort_by(|a, b| {
            (a.product_id, &a.size)
                .cmp(&(b.product_id, &b.size))
        });
        Self { customer_id, lines }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Stable within a process run; feeds idempotency-key derivation.
    ///
    /// Single-instance scope: the derived key only needs to collide with
    /// itself across client retries against the same process.
    pub fn stable_hash(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.customer_id.as_uuid().hash(&mut hasher);
        for line in &self.lines {
            line.product_id.as_uuid().hash(&mut hasher);
            line.size.as_str().hash(&mut hasher);
            line.quantity.hash(&mut hasher);
        }
        hasher.finish()
    }
}
