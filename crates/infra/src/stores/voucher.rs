use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use threadcart_core::{DomainError, DomainResult};
use threadcart_vouchers::{UsageOutcome, Voucher, VoucherLedger, VoucherValidation};

/// In-memory voucher ledger.
///
/// Same slotting discipline as the stock counters: the structural lock only
/// finds the slot, and each voucher mutates under its own mutex, so codes
/// never contend with each other.
#[derive(Default)]
pub struct InMemoryVoucherLedger {
    slots: RwLock<HashMap<String, Arc<Mutex<Voucher>>>>,
}

impl InMemoryVoucherLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, code: &str) -> DomainResult<Option<Arc<Mutex<Voucher>>>> {
        Ok(self
            .slots
            .read()
            .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?
            .get(code)
            .cloned())
    }
}

#[async_trait]
impl VoucherLedger for InMemoryVoucherLedger {
    async fn validate(&self, code: &str, now: DateTime<Utc>) -> DomainResult<VoucherValidation> {
        Ok(match self.slot(code)? {
            Some(slot) => slot
                .lock()
                .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?
                .validation(now),
            None => VoucherValidation::NotFound,
        })
    }

    async fn try_increment_usage(&self, code: &str) -> DomainResult<UsageOutcome> {
        let slot = self.slot(code)?.ok_or(DomainError::NotFound)?;
        let mut voucher = slot
            .lock()
            .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?;
        Ok(if voucher.try_record_usage() {
            UsageOutcome::Committed
        } else {
            UsageOutcome::Exhausted
        })
    }

    async fn decrement_usage(&self, code: &str) -> DomainResult<()> {
        let slot = self.slot(code)?.ok_or(DomainError::NotFound)?;
        let mut voucher = slot
            .lock()
            .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?;
        voucher.release_usage()
    }

    async fn upsert(&self, voucher: Voucher) -> DomainResult<()> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?;
        slots.insert(
            voucher.code().to_string(),
            Arc::new(Mutex::new(voucher)),
        );
        Ok(())
    }

    async fn get(&self, code: &str) -> DomainResult<Option<Voucher>> {
        match self.slot(code)? {
            Some(slot) => Ok(Some(
                slot.lock()
                    .map_err(|_| DomainError::store_unavailable("voucher lock poisoned"))?
                    .clone(),
            )),
            None => Ok(None),
        }
    }
}
