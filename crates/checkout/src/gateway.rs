use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::idempotency::IdempotencyKey;

/// Opaque reference returned by the gateway for an authorized payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Card details as submitted by the client. Held only for the duration of
/// the authorize call, never persisted.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub expiry: String,
    pub cvv: String,
}

impl core::fmt::Debug for CardDetails {
    // Redacted: card numbers must never reach logs.
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &"[redacted]")
            .field("holder", &self.holder)
            .field("expiry", &self.expiry)
            .field("cvv", &"[redacted]")
            .finish()
    }
}

/// Terminal answer from a reachable gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    Approved(PaymentReference),
    Declined,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The gateway could not be reached or did not answer. Retryable with
    /// the same idempotency key.
    #[error("payment gateway unavailable: {0}")]
    Unavailable(String),
}

/// Payment processor contract.
///
/// `authorize` must be idempotent on `key`: re-submitting the same key
/// returns the original outcome and charges at most once. The orchestrator
/// relies on this for its single retry after a timeout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(
        &self,
        key: &IdempotencyKey,
        amount_cents: u64,
        card: &CardDetails,
    ) -> Result<AuthorizeOutcome, GatewayError>;

    /// Release an authorization. Best-effort from the caller's side; the
    /// gateway must make it idempotent.
    async fn void(&self, reference: &PaymentReference) -> Result<(), GatewayError>;
}
