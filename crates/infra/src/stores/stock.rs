use std::collections::BTreeMap;

use async_trait::async_trait;

use threadcart_core::{DomainResult, ProductId, Size};
use threadcart_inventory::{guard_amount, DecrementOutcome, StockKey, StockLedger};

use crate::counter_map::{CounterMap, SubOutcome};

/// In-memory stock ledger on per-key atomic counters.
#[derive(Default)]
pub struct InMemoryStockLedger {
    counters: CounterMap<StockKey>,
}

impl InMemoryStockLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StockLedger for InMemoryStockLedger {
    async fn get_available(&self, product_id: ProductId) -> DomainResult<BTreeMap<Size, u64>> {
        Ok(self
            .counters
            .entries()?
            .into_iter()
            .filter(|(key, _)| key.product_id == product_id)
            .map(|(key, quantity)| (key.size, quantity))
            .collect())
    }

    async fn try_decrement(&self, key: &StockKey, amount: u64) -> DomainResult<DecrementOutcome> {
        guard_amount(amount)?;
        Ok(match self.counters.try_sub(key, amount)? {
            SubOutcome::Applied => DecrementOutcome::Committed,
            SubOutcome::Insufficient { available } => DecrementOutcome::Insufficient { available },
        })
    }

    async fn increment(&self, key: &StockKey, amount: u64) -> DomainResult<()> {
        guard_amount(amount)?;
        self.counters.add(key, amount)
    }

    async fn set_quantity(&self, key: &StockKey, quantity: u64) -> DomainResult<()> {
        self.counters.set(key, quantity)
    }
}
