use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use threadcart_catalog::Product;
use threadcart_core::{ProductId, Size};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_product).get(list_products))
        .route("/:id", get(get_product))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateProductRequest>,
) -> axum::response::Response {
    let mut sizes = Vec::with_capacity(body.sizes.len());
    for label in body.sizes {
        match Size::new(label) {
            Ok(size) => sizes.push(size),
            Err(e) => return errors::domain_error_to_response(e),
        }
    }

    let product = match Product::new(
        ProductId::new(),
        body.name,
        body.color,
        sizes,
        body.unit_price_cents,
    ) {
        Ok(product) => product,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let id = product.id_typed();

    if let Err(e) = services.catalog.upsert(product).await {
        return errors::domain_error_to_response(e);
    }
    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "id": id.to_string() })),
    )
        .into_response()
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    match services.catalog.list().await {
        Ok(products) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "products": products.iter().map(dto::product_to_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => errors::domain_error_to_response(e),
    }
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let product_id: ProductId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id");
        }
    };

    match services.catalog.get(product_id).await {
        Ok(Some(product)) => {
            (StatusCode::OK, Json(dto::product_to_json(&product))).into_response()
        }
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "product not found"),
        Err(e) => errors::domain_error_to_response(e),
    }
}
