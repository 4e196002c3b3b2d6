use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use threadcart_cart::CartSnapshot;
use threadcart_core::{CustomerId, DomainError, DomainResult};

use crate::error::CheckoutError;
use crate::orchestrator::CheckoutOutcome;

/// Bucket width for derived keys. A client retrying a failed submission
/// within this window lands on the same key; a deliberate re-order of the
/// same cart later gets a fresh one.
const DERIVED_KEY_BUCKET_SECS: i64 = 600;

/// How long a completed attempt stays replayable. Two derive buckets covers
/// any retry whose derived key still matches; older slots are evicted lazily
/// on the next `begin` so the map does not grow per unique key forever.
const DONE_SLOT_TTL: Duration = Duration::from_secs(2 * DERIVED_KEY_BUCKET_SECS as u64);

/// Idempotency key for a checkout submission.
///
/// Callers may supply their own; otherwise one is derived from the customer,
/// the cart snapshot hash, and a coarse timestamp bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> DomainResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::validation("idempotency key must not be empty"));
        }
        Ok(Self(key))
    }

    pub fn derive(customer_id: CustomerId, snapshot: &CartSnapshot, now: DateTime<Utc>) -> Self {
        let bucket = now.timestamp().div_euclid(DERIVED_KEY_BUCKET_SECS);
        Self(format!(
            "{}:{:016x}:{}",
            customer_id,
            snapshot.stable_hash(),
            bucket
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

enum Slot {
    InFlight(watch::Receiver<Option<CheckoutOutcome>>),
    Done {
        outcome: CheckoutOutcome,
        completed_at: Instant,
    },
}

/// What `begin` tells the caller about a key.
pub enum Registration {
    /// The key is new; the caller owns the attempt and must `complete` it.
    Owner(watch::Sender<Option<CheckoutOutcome>>),
    /// Another submission with this key is running; await its outcome here.
    InFlight(watch::Receiver<Option<CheckoutOutcome>>),
    /// The attempt already finished.
    Done(CheckoutOutcome),
}

/// Maps idempotency keys to in-flight or completed checkout attempts so a
/// retried submission never produces a second order.
#[derive(Default)]
pub struct IdempotencyRegistry {
    slots: Mutex<HashMap<IdempotencyKey, Slot>>,
}

impl IdempotencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self, key: &IdempotencyKey) -> Result<Registration, CheckoutError> {
        self.begin_with_ttl(key, DONE_SLOT_TTL)
    }

    fn begin_with_ttl(
        &self,
        key: &IdempotencyKey,
        ttl: Duration,
    ) -> Result<Registration, CheckoutError> {
        let mut slots = self
            .slots
            .lock()
            .map_err(|_| CheckoutError::Internal("idempotency registry poisoned".to_string()))?;
        slots.retain(|_, slot| match slot {
            Slot::InFlight(_) => true,
            Slot::Done { completed_at, .. } => completed_at.elapsed() < ttl,
        });
        match slots.get(key) {
            Some(Slot::InFlight(rx)) => Ok(Registration::InFlight(rx.clone())),
            Some(Slot::Done { outcome, .. }) => Ok(Registration::Done(outcome.clone())),
            None => {
                let (tx, rx) = watch::channel(None);
                slots.insert(key.clone(), Slot::InFlight(rx));
                Ok(Registration::Owner(tx))
            }
        }
    }

    /// Record the terminal outcome and wake all waiters. Called exactly once
    /// per owned attempt.
    pub fn complete(
        &self,
        key: &IdempotencyKey,
        tx: &watch::Sender<Option<CheckoutOutcome>>,
        outcome: CheckoutOutcome,
    ) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(
                key.clone(),
                Slot::Done {
                    outcome: outcome.clone(),
                    completed_at: Instant::now(),
                },
            );
        }
        // Waiters holding a receiver from before the slot swap see the value
        // through the channel.
        let _ = tx.send(Some(outcome));
    }

    /// Await an attempt owned by another submission.
    pub async fn await_outcome(
        mut rx: watch::Receiver<Option<CheckoutOutcome>>,
    ) -> CheckoutOutcome {
        loop {
            if let Some(outcome) = rx.borrow().clone() {
                return outcome;
            }
            if rx.changed().await.is_err() {
                // Owner dropped without completing; treat as an aborted
                // submission the client should retry.
                return Err(CheckoutError::Internal(
                    "checkout attempt aborted before reaching a terminal state".to_string(),
                ));
            }
        }
    }
}
