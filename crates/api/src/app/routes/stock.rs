use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};

use threadcart_core::{ProductId, Size};
use threadcart_inventory::StockKey;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:product_id", get(get_availability))
        .route("/:product_id/:size", put(set_quantity))
        .route("/:product_id/:size/receive", post(receive_stock))
}

fn parse_key(product_id: &str, size: &str) -> Result<StockKey, axum::response::Response> {
    let product_id: ProductId = product_id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id")
    })?;
    let size = Size::new(size).map_err(errors::domain_error_to_response)?;
    Ok(StockKey::new(product_id, size))
}

pub async fn get_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.stock.get_available(product_id).await {
        Ok(available) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "product_id": product_id.to_string(),
                "available": available
                    .iter()
                    .map(|(size, quantity)| (size.as_str().to_string(), *quantity))
                    .collect::<std::collections::BTreeMap<_, _>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn set_quantity(
    Extension(services): Extension<Arc<AppServices>>,
    Path((product_id, size)): Path<(String, String)>,
    Json(body): Json<dto::SetQuantityRequest>,
) -> axum::response::Response {
    let key = match parse_key(&product_id, &size) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match services.stock.set_quantity(&key, body.quantity).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn receive_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path((product_id, size)): Path<(String, String)>,
    Json(body): Json<dto::ReceiveStockRequest>,
) -> axum::response::Response {
    let key = match parse_key(&product_id, &size) {
        Ok(key) => key,
        Err(response) => return response,
    };

    match services.stock.increment(&key, body.amount).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}
