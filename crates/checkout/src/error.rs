use thiserror::Error;

use threadcart_core::{ProductId, Size};

/// Terminal failure of a checkout attempt.
///
/// Pre-payment failures (`Validation`, the voucher variants, `PaymentDeclined`,
/// `PaymentTimeout`) leave no side effects. Post-payment failures
/// (`OrderPersistFailure`, `OutOfStock`, `StockCommitConflict`) surface only
/// after compensation ran: the payment is voided and any committed stock is
/// returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// A line could not be committed against available stock. The cart held
    /// a stale quantity; re-submit from a refreshed cart.
    #[error("out of stock: product {product_id} size {size}")]
    OutOfStock { product_id: ProductId, size: Size },

    #[error("payment declined")]
    PaymentDeclined,

    /// The gateway did not answer within the configured budget, including
    /// one idempotent retry. The payment may or may not exist upstream; the
    /// idempotency key makes a later re-submission safe.
    #[error("payment gateway timed out")]
    PaymentTimeout,

    #[error("order could not be persisted; payment was voided")]
    OrderPersistFailure,

    #[error("voucher not found")]
    VoucherNotFound,

    #[error("voucher expired")]
    VoucherExpired,

    #[error("voucher usage cap reached")]
    VoucherExhausted,

    #[error("voucher is not active")]
    VoucherInactive,

    /// Transient store conflict while committing stock. Compensated; the
    /// client should re-submit the whole checkout, never resume mid-sequence.
    #[error("stock commit conflict, retry the checkout")]
    StockCommitConflict,

    #[error("internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    /// True when retrying the same submission (same idempotency key) is safe
    /// and could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::PaymentTimeout | CheckoutError::StockCommitConflict
        )
    }

    /// Stable machine-readable code for wire envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            CheckoutError::Validation(_) => "validation_error",
            CheckoutError::OutOfStock { .. } => "out_of_stock",
            CheckoutError::PaymentDeclined => "payment_declined",
            CheckoutError::PaymentTimeout => "payment_timeout",
            CheckoutError::OrderPersistFailure => "order_persist_failure",
            CheckoutError::VoucherNotFound => "voucher_not_found",
            CheckoutError::VoucherExpired => "voucher_expired",
            CheckoutError::VoucherExhausted => "voucher_exhausted",
            CheckoutError::VoucherInactive => "voucher_inactive",
            CheckoutError::StockCommitConflict => "stock_commit_conflict",
            CheckoutError::Internal(_) => "internal_error",
        }
    }
}
