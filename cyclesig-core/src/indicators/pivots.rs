//! Pivot detection — local highs ("tops") and lows ("bottoms") with a
//! minimum-prominence constraint.
//!
//! Only the most recent `window` bars are scanned. A candidate needs
//! `half_group` bars on both sides; the center of the `2 * half_group + 1`
//! segment must itself equal the segment extreme, and must clear the larger
//! (smaller, for bottoms) of its immediate neighbors by at least
//! `min_prominence`. Plateaus wider than the segment can go undetected.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Indicator, IndicatorError, PRICE_TOLERANCE};
use crate::domain::series::validate_bars;
use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pivot {
    pub time: NaiveDateTime,
    pub price: f64,
}

/// Tops and bottoms, each in chronological order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PivotSet {
    pub tops: Vec<Pivot>,
    pub bottoms: Vec<Pivot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PivotParams {
    pub window: usize,
    pub half_group: usize,
    /// In price units. The pipeline scales it by the instrument's point.
    pub min_prominence: f64,
}

impl Default for PivotParams {
    fn default() -> Self {
        Self {
            window: 500,
            half_group: 3,
            min_prominence: 0.0005,
        }
    }
}

impl PivotParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.half_group == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "pivot_half_group",
                reason: "must be >= 1".into(),
            });
        }
        if self.window == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "pivot_window",
                reason: "must be >= 1".into(),
            });
        }
        if !self.min_prominence.is_finite() || self.min_prominence < 0.0 {
            return Err(IndicatorError::InvalidParameter {
                name: "pivot_min_prominence",
                reason: format!("must be finite and >= 0, got {}", self.min_prominence),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Pivots {
    params: PivotParams,
}

impl Pivots {
    pub fn new(params: PivotParams) -> Result<Self, IndicatorError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &PivotParams {
        &self.params
    }
}

fn is_top(bars: &[Bar], i: usize, k: usize, min_prominence: f64) -> bool {
    let center = bars[i].high;
    let segment_max = bars[i - k..=i + k]
        .iter()
        .map(|b| b.high)
        .fold(f64::NEG_INFINITY, f64::max);
    let neighbor = bars[i - 1].high.max(bars[i + 1].high);
    center == segment_max && center - neighbor + PRICE_TOLERANCE >= min_prominence
}

fn is_bottom(bars: &[Bar], i: usize, k: usize, min_prominence: f64) -> bool {
    let center = bars[i].low;
    let segment_min = bars[i - k..=i + k]
        .iter()
        .map(|b| b.low)
        .fold(f64::INFINITY, f64::min);
    let neighbor = bars[i - 1].low.min(bars[i + 1].low);
    center == segment_min && neighbor - center + PRICE_TOLERANCE >= min_prominence
}

impl Indicator for Pivots {
    type Output = PivotSet;

    fn name(&self) -> &str {
        "pivots"
    }

    fn lookback(&self) -> usize {
        self.params.half_group
    }

    fn compute(&self, bars: &[Bar]) -> Result<PivotSet, IndicatorError> {
        validate_bars(bars)?;
        let PivotParams {
            window,
            half_group: k,
            min_prominence,
        } = self.params;

        let recent = &bars[bars.len().saturating_sub(window)..];
        let mut set = PivotSet::default();
        if recent.len() < 2 * k + 1 {
            return Ok(set);
        }

        for i in k..recent.len() - k {
            if is_top(recent, i, k, min_prominence) {
                set.tops.push(Pivot {
                    time: recent[i].time,
                    price: recent[i].high,
                });
            }
            if is_bottom(recent, i, k, min_prominence) {
                set.bottoms.push(Pivot {
                    time: recent[i].time,
                    price: recent[i].low,
                });
            }
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_hl_bars;

    fn pivots(window: usize, half_group: usize, min_prominence: f64) -> Pivots {
        Pivots::new(PivotParams {
            window,
            half_group,
            min_prominence,
        })
        .unwrap()
    }

    #[test]
    fn monotonic_highs_have_no_tops() {
        let highs: Vec<f64> = (0..50).map(|i| 10.0 + i as f64).collect();
        let lows: Vec<f64> = highs.iter().map(|h| h - 1.0).collect();
        let set = pivots(500, 3, 0.0001).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert!(set.tops.is_empty());
    }

    #[test]
    fn spike_equal_to_prominence_accepted() {
        let highs = [1.0, 1.0, 1.0, 1.5, 1.0, 1.0, 1.0];
        let lows = [0.5; 7];
        let set = pivots(500, 3, 0.5).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert_eq!(set.tops.len(), 1);
        assert_eq!(set.tops[0].price, 1.5);
    }

    #[test]
    fn spike_below_prominence_rejected() {
        let highs = [1.0, 1.0, 1.0, 1.25, 1.0, 1.0, 1.0];
        let lows = [0.5; 7];
        let set = pivots(500, 3, 0.5).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert!(set.tops.is_empty());
    }

    #[test]
    fn decimal_price_spike_at_prominence_accepted() {
        // 1.1005 - 1.1 is 4.99999...e-4 in binary.
        let highs = [1.1, 1.1, 1.1, 1.1005, 1.1, 1.1, 1.1];
        let lows = [1.0995; 7];
        let set = pivots(500, 3, 0.0005).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert_eq!(set.tops.len(), 1);
        assert_eq!(set.tops[0].price, 1.1005);

        let highs = [1.3; 7];
        let lows = [1.2707, 1.2707, 1.2707, 1.2702, 1.2707, 1.2707, 1.2707];
        let set = pivots(500, 3, 0.0005).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert_eq!(set.bottoms.len(), 1);
    }

    #[test]
    fn decimal_price_spike_just_below_prominence_rejected() {
        let highs = [1.1, 1.1, 1.1, 1.1004, 1.1, 1.1, 1.1];
        let lows = [1.0995; 7];
        let set = pivots(500, 3, 0.0005).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert!(set.tops.is_empty());
    }

    #[test]
    fn bottoms_mirror_tops() {
        let highs = [3.0; 7];
        let lows = [2.0, 2.0, 2.0, 1.0, 2.0, 2.0, 2.0];
        let set = pivots(500, 3, 0.5).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert_eq!(set.bottoms.len(), 1);
        assert_eq!(set.bottoms[0].price, 1.0);
    }

    #[test]
    fn center_must_be_segment_extreme() {
        // Bar 3 clears its immediate neighbors but bar 5 is higher.
        let highs = [1.0, 1.0, 1.0, 2.0, 1.0, 3.0, 1.0, 1.0, 1.0];
        let lows = [0.5; 9];
        let set = pivots(500, 3, 0.5).compute(&make_hl_bars(&highs, &lows)).unwrap();
        let prices: Vec<f64> = set.tops.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![3.0]);
    }

    #[test]
    fn edges_without_full_segment_are_skipped() {
        let highs = [5.0, 1.0, 1.0, 1.0, 1.0, 1.0, 5.0];
        let lows = [0.5; 7];
        let set = pivots(500, 3, 0.1).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert!(set.tops.is_empty());
    }

    #[test]
    fn window_discards_older_history() {
        let mut highs = vec![1.0, 1.0, 1.0, 9.0, 1.0, 1.0, 1.0];
        highs.extend([1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0]);
        let lows = vec![0.5; highs.len()];
        let bars = make_hl_bars(&highs, &lows);

        let all = pivots(500, 3, 0.5).compute(&bars).unwrap();
        assert_eq!(all.tops.len(), 2);

        let recent = pivots(7, 3, 0.5).compute(&bars).unwrap();
        assert_eq!(recent.tops.len(), 1);
        assert_eq!(recent.tops[0].price, 2.0);
    }

    #[test]
    fn output_is_chronological() {
        let highs = [1.0, 1.0, 1.0, 2.0, 1.0, 1.0, 1.0, 3.0, 1.0, 1.0, 1.0];
        let lows = [0.5; 11];
        let set = pivots(500, 3, 0.5).compute(&make_hl_bars(&highs, &lows)).unwrap();
        assert_eq!(set.tops.len(), 2);
        assert!(set.tops[0].time < set.tops[1].time);
    }

    #[test]
    fn zero_half_group_rejected() {
        let params = PivotParams {
            half_group: 0,
            ..PivotParams::default()
        };
        assert!(Pivots::new(params).is_err());
    }
}
