//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single instrument at a single sampling interval.
///
/// Timestamps are broker server time. `tick_volume` is the broker's tick count;
/// `real_volume` is exchange-reported volume and stays zero for most OTC
/// instruments (forex, CFDs).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub tick_volume: f64,
    #[serde(default)]
    pub real_volume: f64,
}

impl Bar {
    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Volume used for weighting: tick volume if positive, else real volume, else zero.
    pub fn effective_volume(&self) -> f64 {
        if self.tick_volume > 0.0 {
            self.tick_volume
        } else if self.real_volume > 0.0 {
            self.real_volume
        } else {
            0.0
        }
    }

    /// Candle body as a percentage of the open: |close - open| / open * 100.
    ///
    /// `None` when the open is zero.
    pub fn body_pct(&self) -> Option<f64> {
        if self.open == 0.0 {
            return None;
        }
        Some((self.close - self.open).abs() / self.open * 100.0)
    }

    /// Returns true if any OHLC field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Basic OHLC sanity check: high >= max(open, close) >= min(open, close) >= low.
    ///
    /// Not enforced by the indicator engine; kept for data-quality reporting.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> Bar {
        Bar {
            time: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
            tick_volume: 500.0,
            real_volume: 0.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.open = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0; // below low
        assert!(!bar.is_sane());
    }

    #[test]
    fn typical_price_is_hlc_mean() {
        assert_eq!(sample_bar().typical_price(), (105.0 + 98.0 + 103.0) / 3.0);
    }

    #[test]
    fn effective_volume_falls_back_to_real_volume() {
        let mut bar = sample_bar();
        assert_eq!(bar.effective_volume(), 500.0);
        bar.tick_volume = 0.0;
        bar.real_volume = 42.0;
        assert_eq!(bar.effective_volume(), 42.0);
        bar.real_volume = 0.0;
        assert_eq!(bar.effective_volume(), 0.0);
    }

    #[test]
    fn body_pct_is_relative_to_open() {
        let bar = sample_bar();
        assert!((bar.body_pct().unwrap() - 3.0).abs() < 1e-12);
        let mut zero_open = bar;
        zero_open.open = 0.0;
        assert_eq!(zero_open.body_pct(), None);
    }

    #[test]
    fn missing_real_volume_defaults_to_zero() {
        let json = r#"{"time":"2024-01-02T10:00:00","open":1.0,"high":2.0,"low":0.5,"close":1.5,"tick_volume":10.0}"#;
        let bar: Bar = serde_json::from_str(json).unwrap();
        assert_eq!(bar.real_volume, 0.0);
    }
}
