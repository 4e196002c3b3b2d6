use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use threadcart_core::{CustomerId, DomainError, DomainResult, OrderId, ProductId, Size};

/// One immutable line of a placed order. Captures the unit price observed at
/// checkout time; later catalog edits never reprice an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub size: Size,
    pub quantity: u32,
    pub unit_price_cents: u64,
}

impl OrderLine {
    pub fn line_total_cents(&self) -> u64 {
        self.unit_price_cents.saturating_mul(u64::from(self.quantity))
    }
}

/// Money breakdown frozen at placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingBreakdown {
    pub subtotal_cents: u64,
    pub shipping_fee_cents: u64,
    pub discount_cents: u64,
    pub total_cents: u64,
}

/// Fulfillment status. `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

/// Parameters for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub lines: Vec<OrderLine>,
    pub payment_reference: String,
    pub voucher_code: Option<String>,
    pub pricing: PricingBreakdown,
    pub placed_at: DateTime<Utc>,
}

/// A placed order.
///
/// Orders are placed unconfirmed while the checkout sequence is still
/// committing stock and voucher usage. Confirmation is the last step; an
/// unconfirmed Processing order signals an interrupted checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    customer_id: CustomerId,
    lines: Vec<OrderLine>,
    payment_reference: String,
    voucher_code: Option<String>,
    pricing: PricingBreakdown,
    status: OrderStatus,
    confirmed: bool,
    cancel_reason: Option<String>,
    /// Set when voucher accounting could not be reconciled post-commit.
    voucher_flagged: bool,
    created_at: DateTime<Utc>,
}

impl Order {
    /// Place a new order in Processing, unconfirmed.
    pub fn place(new: NewOrder) -> DomainResult<Self> {
        if new.lines.is_empty() {
            return Err(DomainError::validation("order must have at least one line"));
        }
        if new.lines.iter().any(|l| l.quantity == 0) {
            return Err(DomainError::validation("order line quantity must be positive"));
        }
        if new.payment_reference.trim().is_empty() {
            return Err(DomainError::validation("payment reference must not be empty"));
        }
        Ok(Self {
            id: new.id,
            customer_id: new.customer_id,
            lines: new.lines,
            payment_reference: new.payment_reference,
            voucher_code: new.voucher_code,
            pricing: new.pricing,
            status: OrderStatus::Processing,
            confirmed: false,
            cancel_reason: None,
            voucher_flagged: false,
            created_at: new.placed_at,
        })
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn payment_reference(&self) -> &str {
        &self.payment_reference
    }

    pub fn voucher_code(&self) -> Option<&str> {
        self.voucher_code.as_deref()
    }

    pub fn pricing(&self) -> &PricingBreakdown {
        &self.pricing
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn cancel_reason(&self) -> Option<&str> {
        self.cancel_reason.as_deref()
    }

    pub fn is_voucher_flagged(&self) -> bool {
        self.voucher_flagged
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Mark checkout commit complete. Idempotent.
    pub fn confirm(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Processing {
            return Err(DomainError::invariant(format!(
                "only a Processing order can be confirmed, was {:?}",
                self.status
            )));
        }
        self.confirmed = true;
        Ok(())
    }

    /// Cancel the order. Allowed from Processing only; cancelling a shipped
    /// or delivered order requires a return flow this system does not model.
    pub fn cancel(&mut self, reason: impl Into<String>) -> DomainResult<()> {
        match self.status {
            OrderStatus::Processing => {
                self.status = OrderStatus::Cancelled;
                self.cancel_reason = Some(reason.into());
                Ok(())
            }
            OrderStatus::Cancelled => Ok(()),
            other => Err(DomainError::invariant(format!(
                "cannot cancel an order in status {other:?}"
            ))),
        }
    }

    pub fn mark_shipped(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Processing || !self.confirmed {
            return Err(DomainError::invariant(
                "only a confirmed Processing order can ship",
            ));
        }
        self.status = OrderStatus::Shipped;
        Ok(())
    }

    pub fn mark_delivered(&mut self) -> DomainResult<()> {
        if self.status != OrderStatus::Shipped {
            return Err(DomainError::invariant(
                "only a Shipped order can be delivered",
            ));
        }
        self.status = OrderStatus::Delivered;
        Ok(())
    }

    /// Record that voucher usage accounting diverged from this order and
    /// needs manual reconciliation.
    pub fn flag_voucher_discrepancy(&mut self) {
        self.voucher_flagged = true;
    }
}
