//! `threadcart-checkout` — the cart-to-order commit sequence.
//!
//! A checkout is a strictly ordered, non-atomic sequence:
//! authorize payment, persist the order, decrement stock per line, account
//! voucher usage, confirm. Every failure after payment authorization
//! compensates (void, re-increment, cancel) before surfacing, so a captured
//! payment with no live order is never a terminal state.

pub mod error;
pub mod gateway;
pub mod idempotency;
pub mod orchestrator;
pub mod pricing;

pub use error::CheckoutError;
pub use gateway::{AuthorizeOutcome, CardDetails, GatewayError, PaymentGateway, PaymentReference};
pub use idempotency::{IdempotencyKey, IdempotencyRegistry};
pub use orchestrator::{
    CheckoutConfig, CheckoutOrchestrator, CheckoutOutcome, CheckoutRequest, PendingCheckout,
};
pub use pricing::ShippingPolicy;
