//! Decision reporting — the injected sink for every pipeline outcome.
//!
//! The pipeline never logs through global state on its own; whoever drives an
//! evaluation hands it a reporter. Production uses [`TracingReporter`], tests
//! use [`MemoryReporter`] to assert on what was reported.

use std::sync::Mutex;

use crate::domain::{Direction, Signal, SignalId};
use crate::pipeline::Suppression;

/// Callback for evaluation outcomes.
pub trait DecisionReporter: Send + Sync {
    /// A signal was admitted and handed to the store.
    fn on_emitted(&self, signal: &Signal);

    /// An evaluation stopped at a filter.
    fn on_suppressed(&self, instrument: &str, suppression: &Suppression);

    /// An evaluation was abandoned. `kind` is a stable machine-readable label.
    fn on_error(&self, instrument: &str, kind: &str, error: &dyn std::error::Error);
}

/// Reporter that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl DecisionReporter for TracingReporter {
    fn on_emitted(&self, signal: &Signal) {
        tracing::info!(
            instrument = %signal.instrument,
            id = signal.id.short(),
            direction = %signal.direction,
            cycle = %signal.cycle,
            entry = signal.entry,
            stop = signal.stop,
            target = signal.target,
            adx = signal.adx,
            body_pct = signal.body_pct,
            "signal emitted"
        );
    }

    fn on_suppressed(&self, instrument: &str, suppression: &Suppression) {
        tracing::info!(
            instrument,
            reason = suppression.reason.filter_name(),
            state = ?suppression.filter_state,
            "signal suppressed: {}",
            suppression.reason
        );
    }

    fn on_error(&self, instrument: &str, kind: &str, error: &dyn std::error::Error) {
        tracing::error!(instrument, kind, "evaluation failed: {error}");
    }
}

/// One recorded outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionEvent {
    Emitted {
        instrument: String,
        id: SignalId,
        direction: Direction,
    },
    Suppressed {
        instrument: String,
        reason: &'static str,
    },
    Error {
        instrument: String,
        kind: String,
        message: String,
    },
}

/// Reporter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    events: Mutex<Vec<DecisionEvent>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: DecisionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    /// Snapshot of recorded events in arrival order.
    pub fn events(&self) -> Vec<DecisionEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl DecisionReporter for MemoryReporter {
    fn on_emitted(&self, signal: &Signal) {
        self.push(DecisionEvent::Emitted {
            instrument: signal.instrument.clone(),
            id: signal.id.clone(),
            direction: signal.direction,
        });
    }

    fn on_suppressed(&self, instrument: &str, suppression: &Suppression) {
        self.push(DecisionEvent::Suppressed {
            instrument: instrument.to_string(),
            reason: suppression.reason.filter_name(),
        });
    }

    fn on_error(&self, instrument: &str, kind: &str, error: &dyn std::error::Error) {
        self.push(DecisionEvent::Error {
            instrument: instrument.to_string(),
            kind: kind.to_string(),
            message: error.to_string(),
        });
    }
}
