//! Bar source trait and structured error types.
//!
//! The BarSource trait abstracts over where bars come from (broker terminal
//! export, CSV files, fixtures) so the scheduler can swap implementations and
//! tests can inject canned series.

use std::collections::HashMap;

use thiserror::Error;

use crate::domain::{Bar, Timeframe};

/// Structured error types for bar acquisition.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("bar source unreachable: {0}")]
    Unreachable(String),

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed bar data in {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Trait for bar sources.
///
/// An instrument with no data is not an error: implementations return an
/// empty vector, which the pipeline treats as insufficient data.
pub trait BarSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// The most recent `count` bars for `symbol` on `timeframe`, oldest first.
    fn fetch(&self, symbol: &str, timeframe: Timeframe, count: usize)
        -> Result<Vec<Bar>, DataError>;
}

/// Keep the trailing `count` bars.
pub fn keep_last(mut bars: Vec<Bar>, count: usize) -> Vec<Bar> {
    let excess = bars.len().saturating_sub(count);
    bars.drain(..excess);
    bars
}

/// Bar source over fixed in-memory series.
#[derive(Debug, Clone, Default)]
pub struct StaticBarSource {
    series: HashMap<(String, Timeframe), Vec<Bar>>,
}

impl StaticBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) -> Self {
        self.insert(symbol, timeframe, bars);
        self
    }

    pub fn insert(&mut self, symbol: &str, timeframe: Timeframe, bars: Vec<Bar>) {
        self.series.insert((symbol.to_string(), timeframe), bars);
    }
}

impl BarSource for StaticBarSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        count: usize,
    ) -> Result<Vec<Bar>, DataError> {
        let bars = self
            .series
            .get(&(symbol.to_string(), timeframe))
            .cloned()
            .unwrap_or_default();
        Ok(keep_last(bars, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_ohlc_bars;

    #[test]
    fn static_source_returns_tail() {
        let bars = make_ohlc_bars(&[(1.0, 1.0, 1.0, 1.0), (2.0, 2.0, 2.0, 2.0), (3.0, 3.0, 3.0, 3.0)]);
        let source = StaticBarSource::new().with_series("EURUSD", Timeframe::M5, bars);
        let got = source.fetch("EURUSD", Timeframe::M5, 2).unwrap();
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].close, 2.0);
    }

    #[test]
    fn unknown_series_is_empty_not_error() {
        let source = StaticBarSource::new();
        assert!(source.fetch("EURUSD", Timeframe::H1, 10).unwrap().is_empty());
    }
}
