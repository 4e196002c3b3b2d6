//! `threadcart-cart` — per-customer pending line items.
//!
//! Carts are advisory, not authoritative: a line sitting in a cart reserves
//! no stock. The bound check on line edits improves UX by rejecting
//! obviously-oversized requests early; the authoritative check happens in
//! checkout against the stock ledger.

pub mod line;
pub mod service;
pub mod store;

pub use line::{CartLine, CartSnapshot, SnapshotLine};
pub use service::{CartError, CartService};
pub use store::CartStore;
