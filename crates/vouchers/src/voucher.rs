use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadcart_core::{DomainError, DomainResult};

/// A promotional code with a percentage discount and a usage cap.
///
/// Invariant: `usage_count <= max_usage`. Usable only while
/// `now < expires_at` and `active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    code: String,
    discount_percentage: u8,
    expires_at: DateTime<Utc>,
    max_usage: u32,
    usage_count: u32,
    active: bool,
}

/// Outcome of checking a code against the ledger at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "validation", rename_all = "snake_case")]
pub enum VoucherValidation {
    Valid { discount_percentage: u8 },
    NotFound,
    Expired,
    Exhausted,
    Inactive,
}

impl Voucher {
    pub fn new(
        code: impl Into<String>,
        discount_percentage: u8,
        expires_at: DateTime<Utc>,
        max_usage: u32,
    ) -> DomainResult<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("code cannot be empty"));
        }
        if discount_percentage == 0 || discount_percentage > 100 {
            return Err(DomainError::validation(
                "discount_percentage must be within 1..=100",
            ));
        }
        if max_usage == 0 {
            return Err(DomainError::validation("max_usage must be positive"));
        }

        Ok(Self {
            code: code.trim().to_string(),
            discount_percentage,
            expires_at,
            max_usage,
            usage_count: 0,
            active: true,
        })
    }

    /// Rebuild a voucher from stored fields. For store implementations
    /// hydrating persisted rows; enforces the same invariants as `new`.
    pub fn from_parts(
        code: impl Into<String>,
        discount_percentage: u8,
        expires_at: DateTime<Utc>,
        max_usage: u32,
        usage_count: u32,
        active: bool,
    ) -> DomainResult<Self> {
        let mut voucher = Self::new(code, discount_percentage, expires_at, max_usage)?;
        if usage_count > max_usage {
            return Err(DomainError::invariant(
                "usage_count cannot exceed max_usage",
            ));
        }
        voucher.usage_count = usage_count;
        voucher.active = active;
        Ok(voucher)
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn discount_percentage(&self) -> u8 {
        self.discount_percentage
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn max_usage(&self) -> u32 {
        self.max_usage
    }

    pub fn usage_count(&self) -> u32 {
        self.usage_count
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_exhausted(&self) -> bool {
        self.usage_count >= self.max_usage
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    /// Pure usability check. Time is an argument, never sampled here.
    pub fn validation(&self, now: DateTime<Utc>) -> VoucherValidation {
        if !self.active {
            return VoucherValidation::Inactive;
        }
        if now >= self.expires_at {
            return VoucherValidation::Expired;
        }
        if self.is_exhausted() {
            return VoucherValidation::Exhausted;
        }
        VoucherValidation::Valid {
            discount_percentage: self.discount_percentage,
        }
    }

    /// Conditional usage increment: `usage_count + 1 <= max_usage` or no-op.
    ///
    /// Ledger implementations must call this under per-code serialization.
    pub fn try_record_usage(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.usage_count += 1;
        true
    }

    /// Compensation for order cancellation.
    pub fn release_usage(&mut self) -> DomainResult<()> {
        if self.usage_count == 0 {
            return Err(DomainError::invariant(
                "usage_count cannot go negative",
            ));
        }
        self.usage_count -= 1;
        Ok(())
    }
}
