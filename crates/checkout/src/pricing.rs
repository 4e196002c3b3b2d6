use serde::{Deserialize, Serialize};

use threadcart_core::{DomainError, DomainResult};
use threadcart_orders::PricingBreakdown;

/// Flat shipping fee waived above a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    pub flat_fee_cents: u64,
    pub free_threshold_cents: u64,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            flat_fee_cents: 495,
            free_threshold_cents: 10_000,
        }
    }
}

impl ShippingPolicy {
    pub fn fee_for_subtotal(&self, subtotal_cents: u64) -> u64 {
        if subtotal_cents >= self.free_threshold_cents {
            0
        } else {
            self.flat_fee_cents
        }
    }
}

/// Compute the money breakdown for a priced cart.
///
/// `total = subtotal - discount + shipping`. The discount applies to the
/// subtotal only, never to shipping, and is rounded down to whole cents.
pub fn breakdown(
    line_totals_cents: &[u64],
    discount_percentage: Option<u8>,
    shipping: &ShippingPolicy,
) -> DomainResult<PricingBreakdown> {
    let mut subtotal_cents: u64 = 0;
    for total in line_totals_cents {
        subtotal_cents = subtotal_cents
            .checked_add(*total)
            .ok_or_else(|| DomainError::validation("cart subtotal overflows"))?;
    }

    let discount_cents = match discount_percentage {
        Some(pct @ 1..=100) => subtotal_cents / 100 * u64::from(pct)
            + subtotal_cents % 100 * u64::from(pct) / 100,
        Some(pct) => {
            return Err(DomainError::validation(format!(
                "discount percentage out of range: {pct}"
            )));
        }
        None => 0,
    };

    let shipping_fee_cents = shipping.fee_for_subtotal(subtotal_cents);
    let total_cents = subtotal_cents - discount_cents + shipping_fee_cents;

    Ok(PricingBreakdown {
        subtotal_cents,
        shipping_fee_cents,
        discount_cents,
        total_cents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_voucher_below_threshold_pays_flat_shipping() {
        let b = breakdown(&[2500, 1500], None, &ShippingPolicy::default()).unwrap();
        assert_eq!(b.subtotal_cents, 4000);
        assert_eq!(b.discount_cents, 0);
        assert_eq!(b.shipping_fee_cents, 495);
        assert_eq!(b.total_cents, 4495);
    }

    #[test]
    fn shipping_is_free_at_threshold() {
        let b = breakdown(&[10_000], None, &ShippingPolicy::default()).unwrap();
        assert_eq!(b.shipping_fee_cents, 0);
        assert_eq!(b.total_cents, 10_000);
    }

    #[test]
    fn discount_applies_to_subtotal_not_shipping() {
        let policy = ShippingPolicy {
            flat_fee_cents: 500,
            free_threshold_cents: 50_000,
        };
        let b = breakdown(&[10_000], Some(10), &policy).unwrap();
        assert_eq!(b.discount_cents, 1000);
        assert_eq!(b.shipping_fee_cents, 500);
        assert_eq!(b.total_cents, 9500);
    }

    #[test]
    fn discount_rounds_down_to_whole_cents() {
        let policy = ShippingPolicy {
            flat_fee_cents: 0,
            free_threshold_cents: 0,
        };
        // 3% of 333 cents is 9.99; charged discount is 9.
        let b = breakdown(&[333], Some(3), &policy).unwrap();
        assert_eq!(b.discount_cents, 9);
        assert_eq!(b.total_cents, 324);
    }

    #[test]
    fn full_discount_leaves_only_shipping() {
        let policy = ShippingPolicy {
            flat_fee_cents: 495,
            free_threshold_cents: 100_000,
        };
        let b = breakdown(&[4000], Some(100), &policy).unwrap();
        assert_eq!(b.discount_cents, 4000);
        assert_eq!(b.total_cents, 495);
    }

    #[test]
    fn subtotal_overflow_is_rejected() {
        assert!(breakdown(&[u64::MAX, 1], None, &ShippingPolicy::default()).is_err());
    }

    #[test]
    fn large_subtotal_discount_does_not_overflow() {
        let policy = ShippingPolicy {
            flat_fee_cents: 0,
            free_threshold_cents: 0,
        };
        let subtotal = u64::MAX - 100;
        let b = breakdown(&[subtotal], Some(100), &policy).unwrap();
        assert_eq!(b.discount_cents, subtotal);
        assert_eq!(b.total_cents, 0);
    }
}
