//! HTTP surface for the cart/checkout core.

pub mod app;
