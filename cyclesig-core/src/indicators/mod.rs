//! Indicator engine: VWAP, ADX and pivot detection.
//!
//! Every indicator is a pure function of its input bars and parameters. No state
//! survives between calls, and no value at bar t depends on bars after t.
//! Points lacking enough history are `None` ("undefined"), never an error;
//! malformed input (unsorted timestamps, negative volume) fails fast.

pub mod adx;
pub mod pivots;
pub mod vwap;

pub use adx::{Adx, AdxPoint};
pub use pivots::{Pivot, PivotParams, PivotSet, Pivots};
pub use vwap::{Vwap, VwapPoint};

use crate::domain::{Bar, SeriesError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("invalid input series: {0}")]
    InvalidInput(#[from] SeriesError),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// Slack for inclusive comparisons of price differences.
///
/// A spike of exactly the threshold on decimal prices (1.1005 - 1.1000) comes
/// out a few ulps short in binary floating point; it must still count.
pub const PRICE_TOLERANCE: f64 = 1e-9;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce their output for the entire
/// series in one pass.
///
/// # Look-ahead contamination guard
/// No output at bar t may depend on price data from bar t+1 or later.
pub trait Indicator: Send + Sync {
    type Output;

    /// Human-readable name (e.g., "vwap", "adx_14").
    fn name(&self) -> &str;

    /// Index of the first bar that can carry a defined value.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Result<Self::Output, IndicatorError>;
}

/// Trailing sum over `period` values, recomputed per bar.
///
/// `None` while the window is incomplete or holds an undefined value.
pub fn rolling_sum(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..values.len() {
        out[i] = values[i + 1 - period..=i].iter().copied().sum();
    }
    out
}

/// Trailing mean over `period` values; same undefined rules as [`rolling_sum`].
pub fn rolling_mean(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    rolling_sum(values, period)
        .into_iter()
        .map(|sum| sum.map(|s| s / period as f64))
        .collect()
}

/// Create bars at 5-minute spacing from (open, high, low, close) tuples for testing.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            time: base + chrono::Duration::minutes(5 * i as i64),
            open,
            high,
            low,
            close,
            tick_volume: 1000.0,
            real_volume: 0.0,
        })
        .collect()
}

/// Create bars whose high/low are explicit and open = close = midpoint.
#[cfg(test)]
pub fn make_hl_bars(highs: &[f64], lows: &[f64]) -> Vec<Bar> {
    let data: Vec<_> = highs
        .iter()
        .zip(lows)
        .map(|(&h, &l)| {
            let mid = (h + l) / 2.0;
            (mid, h, l, mid)
        })
        .collect();
    make_ohlc_bars(&data)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
