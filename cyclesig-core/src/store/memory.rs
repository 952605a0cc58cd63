//! In-memory signal store.

use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use super::{
    apply_transition, matches_recent, newest_first, InsertOutcome, SignalStore, StoreError,
};
use crate::domain::{Direction, Signal, SignalId, SignalStatus};

/// Signals kept in insertion order behind a mutex.
#[derive(Debug, Default)]
pub struct MemorySignalStore {
    signals: Mutex<Vec<Signal>>,
}

impl MemorySignalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Signal>>, StoreError> {
        self.signals
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    /// Number of stored signals.
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.is_empty())
    }

    /// Snapshot of every stored signal in insertion order.
    pub fn all(&self) -> Result<Vec<Signal>, StoreError> {
        Ok(self.lock()?.clone())
    }
}

impl SignalStore for MemorySignalStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn find_recent_signal(
        &self,
        instrument: &str,
        direction: Direction,
        statuses: &[SignalStatus],
        since: NaiveDateTime,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .any(|s| matches_recent(s, instrument, direction, statuses, since)))
    }

    fn insert_signal(&self, signal: &Signal) -> Result<InsertOutcome, StoreError> {
        let mut signals = self.lock()?;
        if signals.iter().any(|s| s.id == signal.id) {
            return Ok(InsertOutcome::Duplicate);
        }
        signals.push(signal.clone());
        Ok(InsertOutcome::Inserted)
    }

    fn update_status(&self, id: &SignalId, status: SignalStatus) -> Result<(), StoreError> {
        let mut signals = self.lock()?;
        let signal = signals
            .iter_mut()
            .find(|s| &s.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        apply_transition(signal, status)
    }

    fn recent(&self, limit: usize) -> Result<Vec<Signal>, StoreError> {
        Ok(newest_first(self.lock()?.clone(), limit))
    }
}
