//! `threadcart-inventory` — the stock ledger contract.
//!
//! The stock ledger owns per-(product, size) available-quantity counters and
//! is the single source of truth for inventory. All mutation goes through
//! atomic conditional operations per key; reading a record, mutating it
//! locally and writing it back whole is a lost-update hazard and is not part
//! of this contract.

pub mod ledger;

pub use ledger::{guard_amount, DecrementOutcome, StockKey, StockLedger};
