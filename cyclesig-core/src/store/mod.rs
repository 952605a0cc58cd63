//! Signal store contract.
//!
//! The pipeline reads (duplicate check) then writes (insert) through this
//! trait. Implementations must give a consistent view per instrument between
//! those two calls; cross-instrument locking is not required.

pub mod memory;

pub use memory::MemorySignalStore;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{Direction, Signal, SignalId, SignalStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("signal store unavailable: {0}")]
    Unavailable(String),

    #[error("signal store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt signal record at line {line}: {reason}")]
    Corrupt { line: usize, reason: String },

    #[error("no signal with id {0}")]
    NotFound(SignalId),

    #[error("signal {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: SignalId,
        from: SignalStatus,
        to: SignalStatus,
    },
}

/// Result of an insert. A repeated identity is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

pub trait SignalStore: Send + Sync {
    /// Human-readable name of this store.
    fn name(&self) -> &str;

    /// Whether a signal exists for `instrument` and `direction` with one of
    /// `statuses`, emitted at or after `since`.
    fn find_recent_signal(
        &self,
        instrument: &str,
        direction: Direction,
        statuses: &[SignalStatus],
        since: NaiveDateTime,
    ) -> Result<bool, StoreError>;

    /// Insert a signal; a no-op returning `Duplicate` if the id already exists.
    fn insert_signal(&self, signal: &Signal) -> Result<InsertOutcome, StoreError>;

    /// Move a stored signal to a new lifecycle status.
    fn update_status(&self, id: &SignalId, status: SignalStatus) -> Result<(), StoreError>;

    /// Most recently emitted signals, newest first.
    fn recent(&self, limit: usize) -> Result<Vec<Signal>, StoreError>;
}

/// Shared lookup used by store implementations.
pub fn matches_recent(
    signal: &Signal,
    instrument: &str,
    direction: Direction,
    statuses: &[SignalStatus],
    since: NaiveDateTime,
) -> bool {
    signal.instrument == instrument
        && signal.direction == direction
        && statuses.contains(&signal.status)
        && signal.emitted_at >= since
}

/// Check and apply a status transition on a stored signal.
pub fn apply_transition(signal: &mut Signal, status: SignalStatus) -> Result<(), StoreError> {
    if signal.status == status {
        return Ok(());
    }
    if !signal.status.can_transition_to(status) {
        return Err(StoreError::InvalidTransition {
            id: signal.id.clone(),
            from: signal.status,
            to: status,
        });
    }
    signal.status = status;
    Ok(())
}

/// Newest-first ordering by emission time.
pub fn newest_first(mut signals: Vec<Signal>, limit: usize) -> Vec<Signal> {
    signals.sort_by(|a, b| b.emitted_at.cmp(&a.emitted_at));
    signals.truncate(limit);
    signals
}
