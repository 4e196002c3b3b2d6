use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use threadcart_checkout::{
    AuthorizeOutcome, CardDetails, GatewayError, IdempotencyKey, PaymentGateway, PaymentReference,
};

/// How the in-memory gateway answers authorize calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Approve,
    Decline,
    Unavailable,
}

/// In-memory payment gateway for development wiring and tests.
///
/// Honors the real contract: authorize is idempotent per key (a replayed
/// key returns the original outcome without a second charge) and void is
/// idempotent per reference.
pub struct InMemoryPaymentGateway {
    mode: Mutex<GatewayMode>,
    latency: Option<Duration>,
    authorizations: Mutex<HashMap<IdempotencyKey, AuthorizeOutcome>>,
    voided: Mutex<HashSet<String>>,
    next_reference: AtomicU64,
}

impl InMemoryPaymentGateway {
    pub fn new() -> Self {
        Self::with_latency(None)
    }

    pub fn with_latency(latency: Option<Duration>) -> Self {
        Self {
            mode: Mutex::new(GatewayMode::Approve),
            latency,
            authorizations: Mutex::new(HashMap::new()),
            voided: Mutex::new(HashSet::new()),
            next_reference: AtomicU64::new(1),
        }
    }

    pub fn set_mode(&self, mode: GatewayMode) {
        if let Ok(mut current) = self.mode.lock() {
            *current = mode;
        }
    }

    pub fn authorized_count(&self) -> usize {
        self.authorizations.lock().map(|a| a.len()).unwrap_or(0)
    }

    pub fn voided_count(&self) -> usize {
        self.voided.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_voided(&self, reference: &PaymentReference) -> bool {
        self.voided
            .lock()
            .map(|v| v.contains(reference.as_str()))
            .unwrap_or(false)
    }
}

impl Default for InMemoryPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn authorize(
        &self,
        key: &IdempotencyKey,
        amount_cents: u64,
        _card: &CardDetails,
    ) -> Result<AuthorizeOutcome, GatewayError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        // Replay check before consulting the mode: a replayed key returns
        // the recorded outcome even if the mode changed since.
        if let Ok(authorizations) = self.authorizations.lock() {
            if let Some(existing) = authorizations.get(key) {
                return Ok(existing.clone());
            }
        }

        let mode = self
            .mode
            .lock()
            .map(|m| *m)
            .map_err(|_| GatewayError::Unavailable("gateway state poisoned".to_string()))?;
        let outcome = match mode {
            GatewayMode::Unavailable => {
                return Err(GatewayError::Unavailable("gateway offline".to_string()));
            }
            GatewayMode::Decline => AuthorizeOutcome::Declined,
            GatewayMode::Approve => {
                let n = self.next_reference.fetch_add(1, Ordering::SeqCst);
                info!(%key, amount_cents, "payment authorized");
                AuthorizeOutcome::Approved(PaymentReference::new(format!("pay-{n:08}")))
            }
        };

        if let Ok(mut authorizations) = self.authorizations.lock() {
            authorizations.insert(key.clone(), outcome.clone());
        }
        Ok(outcome)
    }

    async fn void(&self, reference: &PaymentReference) -> Result<(), GatewayError> {
        if let Ok(mut voided) = self.voided.lock() {
            voided.insert(reference.as_str().to_string());
        }
        info!(payment_reference = %reference, "payment voided");
        Ok(())
    }
}
