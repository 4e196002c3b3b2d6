//! `threadcart-infra` — store implementations behind the domain contracts.
//!
//! In-memory stores serve development and tests; the two contended ledgers
//! (stock, vouchers) also have Postgres backends whose conditional UPDATEs
//! carry the same never-below-zero / never-past-cap guarantees at the row
//! level.

pub mod counter_map;
pub mod payments;
pub mod rate_limit;
pub mod stores;

#[cfg(test)]
mod integration_tests;

pub use counter_map::{AddOutcome, CounterMap, SubOutcome};
pub use payments::{GatewayMode, InMemoryPaymentGateway};
pub use rate_limit::DailyActionCounter;
pub use stores::{
    InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryStockLedger,
    InMemoryVoucherLedger, PgStockLedger, PgVoucherLedger,
};
