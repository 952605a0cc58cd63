//! Signal record — the only output of an admitted evaluation.
//!
//! Signals are immutable once created: the core builds one, hands it to the
//! store and never touches it again. Lifecycle transitions after `Pending`
//! belong to whoever executes the signal.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::SignalId;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Long => "long",
            Direction::Short => "short",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Market cycle label derived from the ordering of recent pivots.
///
/// A point-in-time classification, recomputed on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cycle {
    Uptrend,
    Downtrend,
    Indeterminate,
}

impl Cycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cycle::Uptrend => "uptrend",
            Cycle::Downtrend => "downtrend",
            Cycle::Indeterminate => "indeterminate",
        }
    }

    /// Direction a signal takes in this cycle, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            Cycle::Uptrend => Some(Direction::Long),
            Cycle::Downtrend => Some(Direction::Short),
            Cycle::Indeterminate => None,
        }
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status: pending -> in_execution -> closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    InExecution,
    Closed,
}

impl SignalStatus {
    /// Statuses that block a new signal in the same direction.
    pub const OPEN: [SignalStatus; 2] = [SignalStatus::Pending, SignalStatus::InExecution];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalStatus::Pending => "pending",
            SignalStatus::InExecution => "in_execution",
            SignalStatus::Closed => "closed",
        }
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    /// Whether moving from `self` to `next` follows pending -> in_execution -> closed.
    ///
    /// Skipping straight from pending to closed is allowed (cancelled signal).
    pub fn can_transition_to(&self, next: SignalStatus) -> bool {
        matches!(
            (self, next),
            (SignalStatus::Pending, SignalStatus::InExecution)
                | (SignalStatus::Pending, SignalStatus::Closed)
                | (SignalStatus::InExecution, SignalStatus::Closed)
        )
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SignalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(SignalStatus::Pending),
            "in_execution" => Ok(SignalStatus::InExecution),
            "closed" => Ok(SignalStatus::Closed),
            other => Err(format!("unknown signal status '{other}'")),
        }
    }
}

/// An emitted trade signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Signal {
    pub id: SignalId,
    pub instrument: String,
    pub direction: Direction,
    pub entry: f64,
    pub stop: f64,
    pub target: f64,
    pub position_size: f64,
    pub cycle: Cycle,
    /// ADX at emission, rounded to 2 decimals.
    pub adx: f64,
    /// Candle body percentage at emission, rounded to 2 decimals.
    pub body_pct: f64,
    pub status: SignalStatus,
    pub emitted_at: NaiveDateTime,
}

impl Signal {
    /// Distance between entry and stop.
    pub fn risk(&self) -> f64 {
        (self.entry - self.stop).abs()
    }

    /// Distance between target and entry.
    pub fn reward(&self) -> f64 {
        (self.target - self.entry).abs()
    }
}
