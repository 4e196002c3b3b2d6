//! `threadcart-catalog` — product definitions and the read-only catalog
//! contract consumed by cart and checkout.
//!
//! The catalog subsystem itself (browsing, media, merchandising) is an
//! external collaborator; this crate carries only the contract the
//! reservation/checkout core needs from it.

pub mod product;

pub use product::{Product, ProductCatalog};
