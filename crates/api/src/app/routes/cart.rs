use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, put},
    Json, Router,
};

use threadcart_core::{CustomerId, ProductId, Size};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/:customer_id", get(get_cart).delete(clear_cart))
        .route("/:customer_id/lines", put(set_line))
        .route("/:customer_id/lines/:product_id/:size", delete(remove_line))
}

fn parse_customer(id: &str) -> Result<CustomerId, axum::response::Response> {
    id.parse().map_err(|_| {
        errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id")
    })
}

pub async fn set_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
    Json(body): Json<dto::SetCartLineRequest>,
) -> axum::response::Response {
    let customer_id = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let product_id: ProductId = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    let size = match Size::new(body.size) {
        Ok(size) => size,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services
        .cart
        .set_line(customer_id, product_id, size, body.quantity)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn remove_line(
    Extension(services): Extension<Arc<AppServices>>,
    Path((customer_id, product_id, size)): Path<(String, String, String)>,
) -> axum::response::Response {
    let customer_id = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(response) => return response,
    };
    let product_id: ProductId = match product_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };
    let size = match Size::new(size) {
        Ok(size) => size,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.cart.remove_line(customer_id, product_id, &size).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn clear_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer_id = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.cart.clear(customer_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}

pub async fn get_cart(
    Extension(services): Extension<Arc<AppServices>>,
    Path(customer_id): Path<String>,
) -> axum::response::Response {
    let customer_id = match parse_customer(&customer_id) {
        Ok(v) => v,
        Err(response) => return response,
    };

    match services.cart.lines(customer_id).await {
        Ok(lines) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "customer_id": customer_id.to_string(),
                "lines": lines.iter().map(dto::cart_line_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::cart_error_to_response(e),
    }
}
