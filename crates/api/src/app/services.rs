use std::sync::Arc;
use std::time::Duration;

use threadcart_cart::CartService;
use threadcart_catalog::ProductCatalog;
use threadcart_checkout::{CheckoutConfig, CheckoutOrchestrator, ShippingPolicy};
use threadcart_infra::{
    DailyActionCounter, InMemoryCartStore, InMemoryCatalog, InMemoryOrderStore,
    InMemoryPaymentGateway, InMemoryStockLedger, InMemoryVoucherLedger, PgStockLedger,
    PgVoucherLedger,
};
use threadcart_inventory::StockLedger;
use threadcart_orders::OrderStore;
use threadcart_vouchers::VoucherLedger;

/// Shared service graph handed to every handler.
pub struct AppServices {
    pub catalog: Arc<dyn ProductCatalog>,
    pub stock: Arc<dyn StockLedger>,
    pub vouchers: Arc<dyn VoucherLedger>,
    pub orders: Arc<dyn OrderStore>,
    pub cart: CartService,
    pub orchestrator: Arc<CheckoutOrchestrator>,
    pub checkout_limiter: DailyActionCounter,
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Wire the service graph from the environment.
///
/// `USE_PERSISTENT_STORES=true` + `DATABASE_URL` back the two contended
/// ledgers with Postgres; everything else stays in-memory. The payment
/// gateway is the in-process one in both modes; a real processor slots in
/// behind the same trait.
pub async fn build_services() -> AppServices {
    let catalog: Arc<dyn ProductCatalog> = Arc::new(InMemoryCatalog::new());
    let carts = Arc::new(InMemoryCartStore::new());
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());
    let gateway = Arc::new(InMemoryPaymentGateway::new());

    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let (stock, vouchers): (Arc<dyn StockLedger>, Arc<dyn VoucherLedger>) = if use_persistent {
        let database_url =
            std::env::var("DATABASE_URL").expect("USE_PERSISTENT_STORES requires DATABASE_URL");
        let pool = threadcart_infra::stores::postgres::connect(&database_url)
            .await
            .expect("failed to connect to DATABASE_URL");
        let stock = PgStockLedger::new(pool.clone());
        stock.ensure_schema().await.expect("stock schema");
        let vouchers = PgVoucherLedger::new(pool);
        vouchers.ensure_schema().await.expect("voucher schema");
        tracing::info!("using postgres-backed stock and voucher ledgers");
        (Arc::new(stock), Arc::new(vouchers))
    } else {
        tracing::info!("using in-memory stores");
        (
            Arc::new(InMemoryStockLedger::new()),
            Arc::new(InMemoryVoucherLedger::new()),
        )
    };

    let config = CheckoutConfig {
        gateway_timeout: Duration::from_millis(env_u64("GATEWAY_TIMEOUT_MS", 5000)),
        shipping: ShippingPolicy {
            flat_fee_cents: env_u64("SHIPPING_FEE_CENTS", 495),
            free_threshold_cents: env_u64("FREE_SHIPPING_THRESHOLD_CENTS", 10_000),
        },
    };

    let orchestrator = Arc::new(CheckoutOrchestrator::new(
        catalog.clone(),
        stock.clone(),
        vouchers.clone(),
        carts.clone(),
        orders.clone(),
        gateway,
        config,
    ));
    let cart = CartService::new(catalog.clone(), stock.clone(), carts);

    AppServices {
        catalog,
        stock,
        vouchers,
        orders,
        cart,
        orchestrator,
        checkout_limiter: DailyActionCounter::new(env_u64("DAILY_CHECKOUT_CAP", 50)),
    }
}
