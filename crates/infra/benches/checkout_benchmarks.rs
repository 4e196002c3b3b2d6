use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use criterion::{criterion_group, criterion_main, Criterion};

use threadcart_cart::{CartSnapshot, SnapshotLine};
use threadcart_catalog::{Product, ProductCatalog};
use threadcart_checkout::{
    CardDetails, CheckoutConfig, CheckoutOrchestrator, CheckoutRequest, IdempotencyKey,
    ShippingPolicy,
};
use threadcart_core::{CustomerId, ProductId, Size};
use threadcart_infra::{
    CounterMap, InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore, InMemoryPaymentGateway,
    InMemoryStockLedger, InMemoryVoucherLedger, SubOutcome,
};
use threadcart_inventory::{StockKey, StockLedger};

fn counter_hot_key(c: &mut Criterion) {
    let map = CounterMap::new();
    map.set(&"hot", u64::MAX / 2).unwrap();

    c.bench_function("counter_map_try_sub_hot_key", |b| {
        b.iter(|| {
            assert_eq!(map.try_sub(&"hot", 1).unwrap(), SubOutcome::Applied);
        });
    });
}

fn counter_contended(c: &mut Criterion) {
    c.bench_function("counter_map_try_sub_8_threads", |b| {
        b.iter(|| {
            let map = Arc::new(CounterMap::new());
            map.set(&"stock", 8 * 1000).unwrap();
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let map = Arc::clone(&map);
                    std::thread::spawn(move || {
                        for _ in 0..1000 {
                            map.try_sub(&"stock", 1).unwrap();
                        }
                    })
                })
                .collect();
            for handle in handles {
                handle.join().unwrap();
            }
            assert_eq!(map.get(&"stock").unwrap(), 0);
        });
    });
}

fn checkout_happy_path(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();

    let catalog = Arc::new(InMemoryCatalog::new());
    let stock = Arc::new(InMemoryStockLedger::new());
    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        catalog.clone(),
        stock.clone(),
        Arc::new(InMemoryVoucherLedger::new()),
        Arc::new(InMemoryCartStore::new()),
        Arc::new(InMemoryOrderStore::new()),
        Arc::new(InMemoryPaymentGateway::new()),
        CheckoutConfig {
            gateway_timeout: Duration::from_secs(1),
            shipping: ShippingPolicy::default(),
        },
    ));

    let product_id = ProductId::new();
    let size = Size::new("42").unwrap();
    let key = StockKey::new(product_id, size.clone());
    runtime.block_on(async {
        let product =
            Product::new(product_id, "Runner", "black", vec![size.clone()], 8995).unwrap();
        catalog.upsert(product).await.unwrap();
        stock.set_quantity(&key, u64::MAX / 2).await.unwrap();
    });

    let card = CardDetails {
        number: "4111111111111111".to_string(),
        holder: "J Doe".to_string(),
        expiry: "12/27".to_string(),
        cvv: "123".to_string(),
    };

    let mut n = 0u64;
    c.bench_function("checkout_happy_path", |b| {
        b.iter(|| {
            n += 1;
            let customer_id = CustomerId::new();
            let request = CheckoutRequest {
                customer_id,
                snapshot: CartSnapshot::new(
                    customer_id,
                    vec![SnapshotLine {
                        product_id,
                        size: size.clone(),
                        quantity: 1,
                    }],
                ),
                card: card.clone(),
                voucher_code: None,
                idempotency_key: Some(IdempotencyKey::new(format!("bench-{n}")).unwrap()),
                submitted_at: Utc::now(),
            };
            runtime.block_on(orchestrator.checkout(request)).unwrap();
        });
    });
}

criterion_group!(
    benches,
    counter_hot_key,
    counter_contended,
    checkout_happy_path
);
criterion_main!(benches);
