//! `threadcart-vouchers` — promotional-code accounting.
//!
//! The voucher ledger owns per-code discount percentage, expiry, usage count
//! and usage cap. Usage accounting follows the same atomic
//! conditional-update discipline as the stock ledger: a read-then-write
//! pattern under concurrent redemptions can overshoot `max_usage`.

pub mod ledger;
pub mod voucher;

pub use ledger::{UsageOutcome, VoucherLedger};
pub use voucher::{Voucher, VoucherValidation};
