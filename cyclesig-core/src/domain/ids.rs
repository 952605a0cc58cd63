use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Direction;

/// Deterministic signal identity (BLAKE3 of emission time, instrument, direction and levels).
///
/// Two evaluations that produce the same record produce the same id, which is
/// what lets stores treat a repeated insert as a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn from_hash(hash: &str) -> Self {
        Self(hash.to_string())
    }

    /// Derive the identity of a signal from its defining fields.
    pub fn derive(
        emitted_at: NaiveDateTime,
        instrument: &str,
        direction: Direction,
        entry: f64,
        stop: f64,
        target: f64,
    ) -> Self {
        use serde_json::json;

        // Canonical serialization (fixed key order)
        let canonical = json!({
            "direction": direction.as_str(),
            "entry": entry,
            "instrument": instrument,
            "stop": stop,
            "target": target,
            "timestamp": emitted_at.format("%Y-%m-%dT%H:%M:%S%.f").to_string(),
        });

        let hash_bytes = blake3::hash(canonical.to_string().as_bytes());
        Self(hash_bytes.to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
