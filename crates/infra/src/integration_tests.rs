//! Cross-component scenarios on the real in-memory stack: cart service,
//! checkout orchestrator, and the store implementations from this crate.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};

use threadcart_cart::{CartService, CartSnapshot, SnapshotLine};
use threadcart_catalog::{Product, ProductCatalog};
use threadcart_checkout::{
    CardDetails, CheckoutConfig, CheckoutError, CheckoutOrchestrator, CheckoutRequest,
    ShippingPolicy,
};
use threadcart_core::{CustomerId, ProductId, Size};
use threadcart_inventory::{StockKey, StockLedger};
use threadcart_orders::OrderStore;
use threadcart_vouchers::{Voucher, VoucherLedger};

use crate::payments::InMemoryPaymentGateway;
use crate::stores::{
    InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryStockLedger,
    InMemoryVoucherLedger,
};

struct Stack {
    catalog: Arc<InMemoryCatalog>,
    stock: Arc<InMemoryStockLedger>,
    vouchers: Arc<InMemoryVoucherLedger>,
    orders: Arc<InMemoryOrderStore>,
    gateway: Arc<InMemoryPaymentGateway>,
    orchestrator: Arc<CheckoutOrchestrator>,
    cart_service: CartService,
}

fn stack_with_gateway(gateway: InMemoryPaymentGateway) -> Stack {
    let catalog = Arc::new(InMemoryCatalog::new());
    let stock = Arc::new(InMemoryStockLedger::new());
    let vouchers = Arc::new(InMemoryVoucherLedger::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let orders = Arc::new(InMemoryOrderStore::new());
    let gateway = Arc::new(gateway);
    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        catalog.clone(),
        stock.clone(),
        vouchers.clone(),
        carts.clone(),
        orders.clone(),
        gateway.clone(),
        CheckoutConfig {
            gateway_timeout: Duration::from_secs(1),
            shipping: ShippingPolicy {
                flat_fee_cents: 495,
                free_threshold_cents: 50_000,
            },
        },
    ));
    let cart_service = CartService::new(catalog.clone(), stock.clone(), carts);
    Stack {
        catalog,
        stock,
        vouchers,
        orders,
        gateway,
        orchestrator,
        cart_service,
    }
}

fn stack() -> Stack {
    stack_with_gateway(InMemoryPaymentGateway::new())
}

async fn seed_product(stack: &Stack, price_cents: u64, quantity: u64) -> StockKey {
    let product_id = ProductId::new();
    let size = Size::new("42").unwrap();
    let product = Product::new(product_id, "Runner", "black", vec![size.clone()], price_cents)
        .unwrap();
    stack.catalog.upsert(product).await.unwrap();
    let key = StockKey::new(product_id, size);
    stack.stock.set_quantity(&key, quantity).await.unwrap();
    key
}

fn request(customer_id: CustomerId, key: &StockKey, quantity: u32) -> CheckoutRequest {
    CheckoutRequest {
        customer_id,
        snapshot: CartSnapshot::new(
            customer_id,
            vec![SnapshotLine {
                product_id: key.product_id,
                size: key.size.clone(),
                quantity,
            }],
        ),
        card: test_card(),
        voucher_code: None,
        idempotency_key: None,
        submitted_at: Utc::now(),
    }
}

fn test_card() -> CardDetails {
    CardDetails {
        number: "4111111111111111".to_string(),
        holder: "J Doe".to_string(),
        expiry: "12/27".to_string(),
        cvv: "123".to_string(),
    }
}

async fn available(stack: &Stack, key: &StockKey) -> u64 {
    stack
        .stock
        .get_available(key.product_id)
        .await
        .unwrap()
        .get(&key.size)
        .copied()
        .unwrap_or(0)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_checkouts_racing_for_five_units_commit_exactly_one() {
    let stack = stack();
    let key = seed_product(&stack, 8995, 5).await;
    let alice = CustomerId::new();
    let bob = CustomerId::new();

    let (a, b) = tokio::join!(
        stack.orchestrator.checkout(request(alice, &key, 3)),
        stack.orchestrator.checkout(request(bob, &key, 3))
    );

    let outcomes = [a, b];
    let wins = outcomes.iter().filter(|o| o.is_ok()).count();
    assert_eq!(wins, 1, "exactly one of the two submissions may commit");
    let loss = outcomes.iter().find(|o| o.is_err()).unwrap();
    assert!(matches!(
        loss.as_ref().unwrap_err(),
        CheckoutError::OutOfStock { .. }
    ));
    assert_eq!(available(&stack, &key).await, 2);
    // The loser's payment was authorized and then voided.
    assert_eq!(stack.gateway.voided_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn oversubscribed_stock_commits_exactly_the_available_quantity() {
    let stack = stack();
    let key = seed_product(&stack, 2000, 10).await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let orchestrator = stack.orchestrator.clone();
            let key = key.clone();
            tokio::spawn(
                async move { orchestrator.checkout(request(CustomerId::new(), &key, 1)).await },
            )
        })
        .collect();
    let mut wins = 0;
    for handle in handles {
        if handle.await.unwrap().is_ok() {
            wins += 1;
        }
    }

    assert_eq!(wins, 10);
    assert_eq!(available(&stack, &key).await, 0);
    assert_eq!(stack.gateway.voided_count(), 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn voucher_cap_race_commits_once_and_flags_the_loser() {
    // Gateway latency holds both attempts between voucher validation and
    // usage commit, forcing the post-payment race.
    let stack = stack_with_gateway(InMemoryPaymentGateway::with_latency(Some(
        Duration::from_millis(25),
    )));
    let key = seed_product(&stack, 8995, 10).await;
    let voucher = Voucher::new("LAST1", 10, Utc::now() + ChronoDuration::days(1), 1).unwrap();
    stack.vouchers.upsert(voucher).await.unwrap();

    let mut first = request(CustomerId::new(), &key, 1);
    first.voucher_code = Some("LAST1".to_string());
    let mut second = request(CustomerId::new(), &key, 1);
    second.voucher_code = Some("LAST1".to_string());

    let (a, b) = tokio::join!(
        stack.orchestrator.checkout(first),
        stack.orchestrator.checkout(second)
    );

    // Both paid and both keep their order; the voucher race is reconciled
    // by flagging, never by unwinding a stocked order.
    let id_a = a.unwrap();
    let id_b = b.unwrap();
    let voucher = stack.vouchers.get("LAST1").await.unwrap().unwrap();
    assert_eq!(voucher.usage_count(), 1);

    let mut flagged = 0;
    for id in [id_a, id_b] {
        let order = stack.orders.get(id).await.unwrap().unwrap();
        assert!(order.is_confirmed());
        if order.is_voucher_flagged() {
            flagged += 1;
        }
    }
    assert_eq!(flagged, 1, "exactly one order carries the discrepancy flag");
}

#[tokio::test]
async fn cart_to_order_end_to_end() {
    let stack = stack();
    let key = seed_product(&stack, 12_000, 4).await;
    let customer_id = CustomerId::new();

    stack
        .cart_service
        .set_line(customer_id, key.product_id, key.size.clone(), 2)
        .await
        .unwrap();
    let snapshot = stack.cart_service.snapshot(customer_id).await.unwrap();

    let order_id = stack
        .orchestrator
        .checkout(CheckoutRequest {
            customer_id,
            snapshot,
            card: test_card(),
            voucher_code: None,
            idempotency_key: None,
            submitted_at: Utc::now(),
        })
        .await
        .unwrap();

    let order = stack.orders.get(order_id).await.unwrap().unwrap();
    assert!(order.is_confirmed());
    assert_eq!(order.pricing().subtotal_cents, 24_000);
    // Under the 50_000 free-shipping threshold, so the flat fee applies.
    assert_eq!(order.pricing().shipping_fee_cents, 495);
    assert_eq!(order.pricing().total_cents, 24_495);
    assert_eq!(available(&stack, &key).await, 2);
    assert!(stack.cart_service.lines(customer_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn cart_bound_is_advisory_checkout_is_authoritative() {
    let stack = stack();
    let key = seed_product(&stack, 8995, 5).await;
    let slow_shopper = CustomerId::new();
    let fast_shopper = CustomerId::new();

    // The slow shopper's cart passes the advisory bound while stock lasts.
    stack
        .cart_service
        .set_line(slow_shopper, key.product_id, key.size.clone(), 5)
        .await
        .unwrap();

    // The fast shopper buys most of it first.
    stack
        .orchestrator
        .checkout(request(fast_shopper, &key, 4))
        .await
        .unwrap();

    // The cart still holds 5; checkout refuses rather than truncating.
    let snapshot = stack.cart_service.snapshot(slow_shopper).await.unwrap();
    assert_eq!(snapshot.lines[0].quantity, 5);
    let err = stack
        .orchestrator
        .checkout(CheckoutRequest {
            customer_id: slow_shopper,
            snapshot,
            card: test_card(),
            voucher_code: None,
            idempotency_key: None,
            submitted_at: Utc::now(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CheckoutError::OutOfStock { .. }));
    assert_eq!(available(&stack, &key).await, 1);
}
