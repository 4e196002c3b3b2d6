use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};

use threadcart_vouchers::Voucher;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", put(upsert_voucher))
        .route("/:code", get(get_voucher))
}

pub async fn upsert_voucher(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::UpsertVoucherRequest>,
) -> axum::response::Response {
    let mut voucher = match Voucher::new(
        body.code,
        body.discount_percentage,
        body.expires_at,
        body.max_usage,
    ) {
        Ok(voucher) => voucher,
        Err(e) => return errors::domain_error_to_response(e),
    };
    if !body.active {
        voucher.deactivate();
    }
    let code = voucher.code().to_string();

    match services.vouchers.upsert(voucher).await {
        Ok(()) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "code": code })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_voucher(
    Extension(services): Extension<Arc<AppServices>>,
    Path(code): Path<String>,
) -> axum::response::Response {
    match services.vouchers.get(&code).await {
        Ok(Some(voucher)) => {
            (StatusCode::OK, Json(dto::voucher_to_json(&voucher))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "voucher not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}
