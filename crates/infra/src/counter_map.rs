use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, RwLock};

use threadcart_core::{DomainError, DomainResult};

/// Outcome of a conditional subtraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubOutcome {
    Applied,
    Insufficient { available: u64 },
}

/// Outcome of a capped addition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Applied,
    CapExceeded { current: u64 },
}

/// Keyed `u64` counters with per-key atomic conditional updates.
///
/// The structural lock only guards slot lookup and insertion; every counter
/// mutation takes a per-slot mutex, so operations on different keys never
/// block each other. Check-and-update happens under the slot lock in one
/// step; there is no way to read a counter, decide, and write it back.
pub struct CounterMap<K> {
    slots: RwLock<HashMap<K, Arc<Mutex<u64>>>>,
}

impl<K> Default for CounterMap<K> {
    fn default() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash + Clone> CounterMap<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &K) -> DomainResult<Arc<Mutex<u64>>> {
        {
            let slots = self.slots.read().map_err(poisoned)?;
            if let Some(slot) = slots.get(key) {
                return Ok(Arc::clone(slot));
            }
        }
        let mut slots = self.slots.write().map_err(poisoned)?;
        Ok(Arc::clone(
            slots.entry(key.clone()).or_insert_with(Default::default),
        ))
    }

    /// Subtract `amount` only if the counter stays at or above zero.
    pub fn try_sub(&self, key: &K, amount: u64) -> DomainResult<SubOutcome> {
        let slot = self.slot(key)?;
        let mut value = slot.lock().map_err(poisoned)?;
        if *value < amount {
            return Ok(SubOutcome::Insufficient { available: *value });
        }
        *value -= amount;
        Ok(SubOutcome::Applied)
    }

    /// Add `amount` only if the counter stays at or below `cap`.
    pub fn try_add_capped(&self, key: &K, amount: u64, cap: u64) -> DomainResult<AddOutcome> {
        let slot = self.slot(key)?;
        let mut value = slot.lock().map_err(poisoned)?;
        match value.checked_add(amount) {
            Some(next) if next <= cap => {
                *value = next;
                Ok(AddOutcome::Applied)
            }
            _ => Ok(AddOutcome::CapExceeded { current: *value }),
        }
    }

    pub fn add(&self, key: &K, amount: u64) -> DomainResult<()> {
        let slot = self.slot(key)?;
        let mut value = slot.lock().map_err(poisoned)?;
        *value = value
            .checked_add(amount)
            .ok_or_else(|| DomainError::invariant("counter overflow"))?;
        Ok(())
    }

    pub fn set(&self, key: &K, new_value: u64) -> DomainResult<()> {
        let slot = self.slot(key)?;
        let mut value = slot.lock().map_err(poisoned)?;
        *value = new_value;
        Ok(())
    }

    pub fn get(&self, key: &K) -> DomainResult<u64> {
        let slots = self.slots.read().map_err(poisoned)?;
        match slots.get(key) {
            Some(slot) => Ok(*slot.lock().map_err(poisoned)?),
            None => Ok(0),
        }
    }

    /// Clone out every (key, value) pair. Point-in-time per slot, not a
    /// consistent cut across the map; callers treat it as advisory.
    pub fn entries(&self) -> DomainResult<Vec<(K, u64)>> {
        let slots = self.slots.read().map_err(poisoned)?;
        let mut entries = Vec::with_capacity(slots.len());
        for (key, slot) in slots.iter() {
            entries.push((key.clone(), *slot.lock().map_err(poisoned)?));
        }
        Ok(entries)
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> DomainError {
    DomainError::store_unavailable("counter lock poisoned")
}
