use std::sync::Arc;

use axum::{
    extract::Extension, http::StatusCode, response::IntoResponse, routing::post, Json, Router,
};
use chrono::Utc;

use threadcart_checkout::{CheckoutRequest, IdempotencyKey};
use threadcart_core::CustomerId;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new().route("/", post(submit_checkout))
}

pub async fn submit_checkout(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckoutSubmitRequest>,
) -> axum::response::Response {
    let customer_id: CustomerId = match body.customer_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id");
        }
    };

    let now = Utc::now();
    match services.checkout_limiter.try_record(customer_id, now) {
        Ok(true) => {}
        Ok(false) => {
            return errors::json_error(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "daily checkout limit reached",
            );
        }
        Err(e) => return errors::domain_error_to_response(e),
    }

    let idempotency_key = match body.idempotency_key {
        Some(raw) => match IdempotencyKey::new(raw) {
            Ok(key) => Some(key),
            Err(e) => return errors::domain_error_to_response(e),
        },
        None => None,
    };

    let snapshot = match services.cart.snapshot(customer_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => return errors::cart_error_to_response(e),
    };

    let outcome = services
        .orchestrator
        .checkout(CheckoutRequest {
            customer_id,
            snapshot,
            card: body.card,
            voucher_code: body.voucher_code,
            idempotency_key,
            submitted_at: now,
        })
        .await;

    match outcome {
        Ok(order_id) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "order_id": order_id.to_string() })),
        )
            .into_response(),
        Err(e) => errors::checkout_error_to_response(e),
    }
}
