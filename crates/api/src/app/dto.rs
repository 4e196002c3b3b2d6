use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;

use threadcart_cart::CartLine;
use threadcart_catalog::Product;
use threadcart_checkout::CardDetails;
use threadcart_core::Size;
use threadcart_orders::Order;
use threadcart_vouchers::Voucher;

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub color: String,
    pub sizes: Vec<String>,
    pub unit_price_cents: u64,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveStockRequest {
    pub amount: u64,
}

#[derive(Debug, Deserialize)]
pub struct UpsertVoucherRequest {
    pub code: String,
    pub discount_percentage: u8,
    pub expires_at: DateTime<Utc>,
    pub max_usage: u32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SetCartLineRequest {
    pub product_id: String,
    pub size: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct CheckoutSubmitRequest {
    pub customer_id: String,
    pub card: CardDetails,
    pub voucher_code: Option<String>,
    pub idempotency_key: Option<String>,
}

pub fn product_to_json(product: &Product) -> serde_json::Value {
    json!({
        "id": product.id_typed().to_string(),
        "name": product.name(),
        "color": product.color(),
        "sizes": product.sizes().iter().map(Size::as_str).collect::<Vec<_>>(),
        "unit_price_cents": product.unit_price_cents(),
    })
}

pub fn voucher_to_json(voucher: &Voucher) -> serde_json::Value {
    json!({
        "code": voucher.code(),
        "discount_percentage": voucher.discount_percentage(),
        "expires_at": voucher.expires_at(),
        "max_usage": voucher.max_usage(),
        "usage_count": voucher.usage_count(),
        "active": voucher.is_active(),
    })
}

pub fn cart_line_to_json(line: &CartLine) -> serde_json::Value {
    json!({
        "product_id": line.product_id.to_string(),
        "size": line.size.as_str(),
        "quantity": line.quantity,
    })
}

pub fn order_to_json(order: &Order) -> serde_json::Value {
    json!({
        "id": order.id().to_string(),
        "customer_id": order.customer_id().to_string(),
        "status": order.status(),
        "confirmed": order.is_confirmed(),
        "lines": order.lines().iter().map(|line| json!({
            "product_id": line.product_id.to_string(),
            "size": line.size.as_str(),
            "quantity": line.quantity,
            "unit_price_cents": line.unit_price_cents,
        })).collect::<Vec<_>>(),
        "voucher_code": order.voucher_code(),
        "voucher_flagged": order.is_voucher_flagged(),
        "payment_reference": order.payment_reference(),
        "pricing": {
            "subtotal_cents": order.pricing().subtotal_cents,
            "shipping_fee_cents": order.pricing().shipping_fee_cents,
            "discount_cents": order.pricing().discount_cents,
            "total_cents": order.pricing().total_cents,
        },
        "cancel_reason": order.cancel_reason(),
        "created_at": order.created_at(),
    })
}
