//! `threadcart-orders` — placed orders and their lifecycle.
//!
//! Order lines and money amounts are immutable after placement; only the
//! status machine (`Processing → Shipped → Delivered`, terminal `Cancelled`)
//! and the confirmation/flag bits move.

pub mod order;
pub mod store;

pub use order::{NewOrder, Order, OrderLine, OrderStatus, PricingBreakdown};
pub use store::OrderStore;
