use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadcart_core::DomainResult;

use crate::voucher::{Voucher, VoucherValidation};

/// Result of a conditional usage increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum UsageOutcome {
    Committed,
    Exhausted,
}

/// Per-code voucher accounting. Serialized per code, never globally.
///
/// `try_increment_usage` is linearizable per code: for a cap `M` and
/// starting count `U`, at most `M - U` concurrent calls commit.
#[async_trait]
pub trait VoucherLedger: Send + Sync {
    /// Check a code's usability at `now` without consuming anything.
    async fn validate(&self, code: &str, now: DateTime<Utc>) -> DomainResult<VoucherValidation>;

    /// Atomic conditional increment: commits only if
    /// `usage_count + 1 <= max_usage`.
    async fn try_increment_usage(&self, code: &str) -> DomainResult<UsageOutcome>;

    /// Compensation for order cancellation.
    async fn decrement_usage(&self, code: &str) -> DomainResult<()>;

    /// Seeding/admin surface.
    async fn upsert(&self, voucher: Voucher) -> DomainResult<()>;

    async fn get(&self, code: &str) -> DomainResult<Option<Voucher>>;
}
