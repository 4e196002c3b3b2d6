use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use threadcart_cart::CartError;
use threadcart_checkout::CheckoutError;
use threadcart_core::DomainError;

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::StoreUnavailable(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn cart_error_to_response(err: CartError) -> axum::response::Response {
    match err {
        CartError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        CartError::UnknownProduct(id) => json_error(
            StatusCode::NOT_FOUND,
            "unknown_product",
            format!("unknown product {id}"),
        ),
        CartError::InvalidSize { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_size", err.to_string())
        }
        CartError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", err.to_string())
        }
        CartError::Store(inner) => domain_error_to_response(inner),
    }
}

pub fn checkout_error_to_response(err: CheckoutError) -> axum::response::Response {
    let code = err.code();
    let message = err.to_string();
    let status = match err {
        CheckoutError::Validation(_) => StatusCode::BAD_REQUEST,
        CheckoutError::OutOfStock { .. } | CheckoutError::StockCommitConflict => {
            StatusCode::CONFLICT
        }
        CheckoutError::PaymentDeclined => StatusCode::PAYMENT_REQUIRED,
        CheckoutError::PaymentTimeout => StatusCode::GATEWAY_TIMEOUT,
        CheckoutError::VoucherNotFound
        | CheckoutError::VoucherExpired
        | CheckoutError::VoucherExhausted
        | CheckoutError::VoucherInactive => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::OrderPersistFailure | CheckoutError::Internal(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    json_error(status, code, message)
}
