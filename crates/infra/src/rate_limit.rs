use chrono::{DateTime, Utc};

use threadcart_core::{CustomerId, DomainResult};

use crate::counter_map::{AddOutcome, CounterMap};

const SECS_PER_DAY: i64 = 86_400;

/// Per-customer, per-UTC-day action counter on the same atomic-counter
/// primitive as the stock ledger: recording and checking the cap is one
/// conditional step, so concurrent submissions cannot slip past it.
///
/// Old day buckets are never read again; the map grows by one entry per
/// active customer per day, which in-memory wiring tolerates.
pub struct DailyActionCounter {
    counters: CounterMap<(CustomerId, i64)>,
    daily_cap: u64,
}

impl DailyActionCounter {
    pub fn new(daily_cap: u64) -> Self {
        Self {
            counters: CounterMap::new(),
            daily_cap,
        }
    }

    /// Record one action. Returns false when the customer already hit
    /// today's cap; the action is not counted in that case.
    pub fn try_record(&self, customer_id: CustomerId, now: DateTime<Utc>) -> DomainResult<bool> {
        let day = now.timestamp().div_euclid(SECS_PER_DAY);
        Ok(matches!(
            self.counters
                .try_add_capped(&(customer_id, day), 1, self.daily_cap)?,
            AddOutcome::Applied
        ))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[test]
    fn cap_applies_per_customer_per_day() {
        let counter = DailyActionCounter::new(2);
        let me = CustomerId::new();
        let other = CustomerId::new();
        let noon = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        assert!(counter.try_record(me, noon).unwrap());
        assert!(counter.try_record(me, noon).unwrap());
        assert!(!counter.try_record(me, noon).unwrap());

        // Another customer and the next day are separate buckets.
        assert!(counter.try_record(other, noon).unwrap());
        assert!(counter.try_record(me, noon + Duration::days(1)).unwrap());
    }
}
