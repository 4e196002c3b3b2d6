use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{info, warn};

use threadcart_cart::{CartSnapshot, CartStore};
use threadcart_catalog::ProductCatalog;
use threadcart_core::{CustomerId, DomainError, DomainResult, OrderId};
use threadcart_inventory::{DecrementOutcome, StockKey, StockLedger};
use threadcart_orders::{NewOrder, Order, OrderLine, OrderStatus, OrderStore};
use threadcart_vouchers::{UsageOutcome, VoucherLedger, VoucherValidation};

use crate::error::CheckoutError;
use crate::gateway::{AuthorizeOutcome, CardDetails, GatewayError, PaymentGateway, PaymentReference};
use crate::idempotency::{IdempotencyKey, IdempotencyRegistry, Registration};
use crate::pricing::{self, ShippingPolicy};

/// Terminal result of a checkout attempt.
pub type CheckoutOutcome = Result<OrderId, CheckoutError>;

#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Budget for one gateway authorize call. A timeout is retried once with
    /// the same idempotency key.
    pub gateway_timeout: Duration,
    pub shipping: ShippingPolicy,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            gateway_timeout: Duration::from_secs(5),
            shipping: ShippingPolicy::default(),
        }
    }
}

/// A checkout submission.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: CustomerId,
    pub snapshot: CartSnapshot,
    pub card: CardDetails,
    pub voucher_code: Option<String>,
    /// Client-supplied key; derived from the submission when absent.
    pub idempotency_key: Option<IdempotencyKey>,
    pub submitted_at: DateTime<Utc>,
}

/// Handle to a submitted checkout. The attempt itself runs on its own task;
/// dropping this handle (a disconnecting client) never interrupts it.
pub struct PendingCheckout {
    state: PendingState,
}

enum PendingState {
    Ready(CheckoutOutcome),
    Waiting(watch::Receiver<Option<CheckoutOutcome>>),
}

impl PendingCheckout {
    pub async fn outcome(self) -> CheckoutOutcome {
        match self.state {
            PendingState::Ready(outcome) => outcome,
            PendingState::Waiting(rx) => IdempotencyRegistry::await_outcome(rx).await,
        }
    }
}

/// Drives the commit sequence: authorize payment, persist the order,
/// decrement stock per line, account voucher usage, confirm. Compensates on
/// every post-payment failure.
pub struct CheckoutOrchestrator {
    catalog: Arc<dyn ProductCatalog>,
    stock: Arc<dyn StockLedger>,
    vouchers: Arc<dyn VoucherLedger>,
    carts: Arc<dyn CartStore>,
    orders: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    registry: IdempotencyRegistry,
    config: CheckoutConfig,
}

impl CheckoutOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        stock: Arc<dyn StockLedger>,
        vouchers: Arc<dyn VoucherLedger>,
        carts: Arc<dyn CartStore>,
        orders: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        config: CheckoutConfig,
    ) -> Self {
        Self {
            catalog,
            stock,
            vouchers,
            carts,
            orders,
            gateway,
            registry: IdempotencyRegistry::new(),
            config,
        }
    }

    /// Submit a checkout. Registers the idempotency key and spawns the
    /// attempt on its own task before returning, so the sequence always
    /// reaches a terminal state even if the caller goes away.
    ///
    /// Re-submission with the same key attaches to the running attempt or
    /// returns the recorded outcome; it never starts a second one.
    pub fn submit(self: &Arc<Self>, request: CheckoutRequest) -> PendingCheckout {
        let key = match &request.idempotency_key {
            Some(key) => key.clone(),
            None => IdempotencyKey::derive(
                request.customer_id,
                &request.snapshot,
                request.submitted_at,
            ),
        };

        let registration = match self.registry.begin(&key) {
            Ok(registration) => registration,
            Err(err) => {
                return PendingCheckout {
                    state: PendingState::Ready(Err(err)),
                };
            }
        };

        match registration {
            Registration::Done(outcome) => PendingCheckout {
                state: PendingState::Ready(outcome),
            },
            Registration::InFlight(rx) => PendingCheckout {
                state: PendingState::Waiting(rx),
            },
            Registration::Owner(tx) => {
                let rx = tx.subscribe();
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let outcome = this.run(&key, request).await;
                    this.registry.complete(&key, &tx, outcome);
                });
                PendingCheckout {
                    state: PendingState::Waiting(rx),
                }
            }
        }
    }

    /// Submit and await the terminal outcome.
    pub async fn checkout(self: &Arc<Self>, request: CheckoutRequest) -> CheckoutOutcome {
        self.submit(request).outcome().await
    }

    async fn run(&self, key: &IdempotencyKey, request: CheckoutRequest) -> CheckoutOutcome {
        let customer_id = request.customer_id;
        info!(%key, %customer_id, "checkout initiated");

        // Price the snapshot against the catalog before touching anything.
        let lines = self.price_lines(&request.snapshot).await?;
        let discount_percentage = match &request.voucher_code {
            Some(code) => Some(self.validate_voucher(code, request.submitted_at).await?),
            None => None,
        };
        let pricing = pricing::breakdown(
            &lines.iter().map(OrderLine::line_total_cents).collect::<Vec<_>>(),
            discount_percentage,
            &self.config.shipping,
        )
        .map_err(|e| CheckoutError::Validation(e.to_string()))?;

        // Step: payment. The only side effect so far; declined/timeout
        // terminate with nothing to compensate.
        let reference = self
            .authorize_with_retry(key, pricing.total_cents, &request.card)
            .await?;
        info!(%key, %customer_id, payment_reference = %reference, "payment authorized");

        // Step: persist the order, unconfirmed.
        let order_id = OrderId::new();
        let order = Order::place(NewOrder {
            id: order_id,
            customer_id,
            lines: lines.clone(),
            payment_reference: reference.as_str().to_string(),
            voucher_code: request.voucher_code.clone(),
            pricing,
            placed_at: request.submitted_at,
        })
        .map_err(|e| CheckoutError::Validation(e.to_string()))?;
        if let Err(err) = self.orders.insert(order).await {
            warn!(%key, %order_id, %err, "order persist failed, voiding payment");
            self.void_payment(&reference).await;
            return Err(CheckoutError::OrderPersistFailure);
        }
        info!(%key, %order_id, "order persisted");

        // Step: commit stock, all lines or none.
        if let Err(err) = self.commit_stock(&lines).await {
            self.void_payment(&reference).await;
            if let Err(cancel_err) = self.orders.cancel(order_id, &err.to_string()).await {
                warn!(%order_id, %cancel_err, "order cancellation failed after stock rollback");
            }
            info!(%key, %order_id, %err, "checkout failed, compensated");
            return Err(err);
        }
        info!(%key, %order_id, "stock committed");

        // Step: voucher usage. Failure here is reconciled, never unwound;
        // unwinding a fully stocked, paid order over voucher accounting
        // would punish the customer for a promotional race.
        if let Some(code) = &request.voucher_code {
            self.commit_voucher(code, order_id).await;
        }

        if let Err(err) = self.orders.confirm(order_id).await {
            warn!(%order_id, %err, "order confirmation failed, order stays unconfirmed");
        }
        self.clear_cart_lines(&request.snapshot).await;

        info!(%key, %order_id, total_cents = pricing.total_cents, "checkout completed");
        Ok(order_id)
    }

    async fn price_lines(&self, snapshot: &CartSnapshot) -> Result<Vec<OrderLine>, CheckoutError> {
        if snapshot.is_empty() {
            return Err(CheckoutError::Validation("cart is empty".to_string()));
        }
        let mut lines = Vec::with_capacity(snapshot.lines.len());
        for line in &snapshot.lines {
            let product = self
                .catalog
                .get(line.product_id)
                .await
                .map_err(internal)?
                .ok_or_else(|| {
                    CheckoutError::Validation(format!("unknown product {}", line.product_id))
                })?;
            if !product.has_size(&line.size) {
                return Err(CheckoutError::Validation(format!(
                    "product {} does not come in size {}",
                    line.product_id, line.size
                )));
            }
            if line.quantity == 0 {
                return Err(CheckoutError::Validation("line quantity must be positive".to_string()));
            }
            lines.push(OrderLine {
                product_id: line.product_id,
                size: line.size.clone(),
                quantity: line.quantity,
                unit_price_cents: product.unit_price_cents(),
            });
        }
        Ok(lines)
    }

    async fn validate_voucher(
        &self,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<u8, CheckoutError> {
        match self.vouchers.validate(code, now).await.map_err(internal)? {
            VoucherValidation::Valid {
                discount_percentage,
            } => Ok(discount_percentage),
            VoucherValidation::NotFound => Err(CheckoutError::VoucherNotFound),
            VoucherValidation::Expired => Err(CheckoutError::VoucherExpired),
            VoucherValidation::Exhausted => Err(CheckoutError::VoucherExhausted),
            VoucherValidation::Inactive => Err(CheckoutError::VoucherInactive),
        }
    }

    async fn authorize_with_retry(
        &self,
        key: &IdempotencyKey,
        amount_cents: u64,
        card: &CardDetails,
    ) -> Result<PaymentReference, CheckoutError> {
        for attempt in 0..2u8 {
            let call = self.gateway.authorize(key, amount_cents, card);
            match tokio::time::timeout(self.config.gateway_timeout, call).await {
                Ok(Ok(AuthorizeOutcome::Approved(reference))) => return Ok(reference),
                Ok(Ok(AuthorizeOutcome::Declined)) => return Err(CheckoutError::PaymentDeclined),
                Ok(Err(GatewayError::Unavailable(msg))) => {
                    warn!(%key, attempt, %msg, "payment gateway unavailable");
                }
                Err(_elapsed) => {
                    warn!(%key, attempt, "payment authorize timed out");
                }
            }
        }
        Err(CheckoutError::PaymentTimeout)
    }

    /// Decrement every line or none. On failure, re-increments the lines
    /// already committed for this attempt.
    async fn commit_stock(&self, lines: &[OrderLine]) -> Result<(), CheckoutError> {
        let mut committed: Vec<(StockKey, u64)> = Vec::with_capacity(lines.len());
        for line in lines {
            let key = StockKey::new(line.product_id, line.size.clone());
            let amount = u64::from(line.quantity);
            let failure = match self.stock.try_decrement(&key, amount).await {
                Ok(DecrementOutcome::Committed) => {
                    committed.push((key, amount));
                    continue;
                }
                Ok(DecrementOutcome::Insufficient { available }) => {
                    warn!(%key, requested = amount, available, "insufficient stock at commit");
                    CheckoutError::OutOfStock {
                        product_id: line.product_id,
                        size: line.size.clone(),
                    }
                }
                Err(err) => {
                    warn!(%key, %err, "stock decrement hit a store conflict");
                    CheckoutError::StockCommitConflict
                }
            };
            for (key, amount) in committed.iter().rev() {
                if let Err(err) = self.stock.increment(key, *amount).await {
                    // The order is being cancelled either way; a failed
                    // re-increment leaves stock under-counted and needs
                    // the same manual reconciliation as a lost update.
                    warn!(%key, amount, %err, "stock rollback failed, counter needs reconciliation");
                }
            }
            return Err(failure);
        }
        Ok(())
    }

    async fn commit_voucher(&self, code: &str, order_id: OrderId) {
        let flag_reason = match self.vouchers.try_increment_usage(code).await {
            Ok(UsageOutcome::Committed) => {
                info!(%order_id, code, "voucher usage committed");
                return;
            }
            Ok(UsageOutcome::Exhausted) => "usage cap reached between validation and commit",
            Err(_) => "voucher ledger unavailable at commit",
        };
        warn!(%order_id, code, flag_reason, "voucher accounting discrepancy, flagging order");
        if let Err(err) = self.orders.flag_voucher_discrepancy(order_id).await {
            warn!(%order_id, %err, "failed to flag order for voucher reconciliation");
        }
    }

    async fn void_payment(&self, reference: &PaymentReference) {
        if let Err(err) = self.gateway.void(reference).await {
            // The void is idempotent upstream; an unreachable gateway here
            // leaves a dangling authorization for reconciliation.
            warn!(payment_reference = %reference, %err, "payment void failed");
        }
    }

    /// Remove exactly the lines this checkout consumed. Lines added after
    /// the snapshot was taken stay in the cart.
    async fn clear_cart_lines(&self, snapshot: &CartSnapshot) {
        for line in &snapshot.lines {
            if let Err(err) = self
                .carts
                .remove_line(snapshot.customer_id, line.product_id, &line.size)
                .await
            {
                warn!(customer_id = %snapshot.customer_id, product_id = %line.product_id, %err,
                    "failed to clear cart line after checkout");
            }
        }
    }

    /// Compensation hook for a completed checkout: returns stock and voucher
    /// usage, voids the payment, marks the order Cancelled.
    ///
    /// Only a confirmed Processing order cancels; shipped and delivered
    /// orders are out of scope, and an unconfirmed one is still owned by a
    /// running checkout attempt.
    pub async fn cancel_order(&self, order_id: OrderId) -> DomainResult<()> {
        let order = self
            .orders
            .get(order_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if order.status() != OrderStatus::Processing || !order.is_confirmed() {
            return Err(DomainError::invariant(
                "only a confirmed Processing order can be cancelled",
            ));
        }

        for line in order.lines() {
            let key = StockKey::new(line.product_id, line.size.clone());
            self.stock.increment(&key, u64::from(line.quantity)).await?;
        }
        if let Some(code) = order.voucher_code() {
            if let Err(err) = self.vouchers.decrement_usage(code).await {
                warn!(%order_id, code, %err, "voucher usage return failed on cancellation");
            }
        }
        self.void_payment(&PaymentReference::new(order.payment_reference()))
            .await;
        self.orders.cancel(order_id, "cancelled by customer").await?;
        info!(%order_id, "order cancelled, stock and voucher usage returned");
        Ok(())
    }
}

fn internal(err: DomainError) -> CheckoutError {
    CheckoutError::Internal(err.to_string())
}
