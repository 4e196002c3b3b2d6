use axum::Router;

pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;
pub mod stock;
pub mod system;
pub mod vouchers;

pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/stock", stock::router())
        .nest("/vouchers", vouchers::router())
        .nest("/cart", cart::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
}
