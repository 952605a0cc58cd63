//! ADX — Average Directional Index over plain trailing windows.
//!
//! Steps:
//! 1. TR, +DM and -DM from each bar and its predecessor (undefined at bar 0)
//! 2. Trailing sums of TR, +DM and -DM over `period` bars
//! 3. +DI = 100 * sum(+DM) / sum(TR), -DI likewise; undefined when sum(TR) = 0
//! 4. DX = 100 * |+DI - -DI| / (+DI + -DI); undefined when the DI sum is 0
//! 5. ADX = trailing mean of DX over `period` bars
//!
//! Sums are plain rolling sums, not Wilder's recursive smoothing, so a value
//! depends only on the last 2 * period bars. The first defined ADX sits at
//! index 2 * period - 1.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{rolling_mean, rolling_sum, Indicator, IndicatorError};
use crate::domain::series::validate_bars;
use crate::domain::Bar;

/// Per-bar ADX breakdown. Every stage is kept so callers can log the inputs
/// behind a decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdxPoint {
    pub time: NaiveDateTime,
    pub true_range: Option<f64>,
    pub plus_dm: Option<f64>,
    pub minus_dm: Option<f64>,
    pub plus_di: Option<f64>,
    pub minus_di: Option<f64>,
    pub dx: Option<f64>,
    pub adx: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidParameter {
                name: "adx_period",
                reason: "must be >= 1".into(),
            });
        }
        Ok(Self {
            period,
            name: format!("adx_{period}"),
        })
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

fn true_range(bar: &Bar, prev: &Bar) -> f64 {
    (bar.high - bar.low)
        .max((bar.high - prev.close).abs())
        .max((bar.low - prev.close).abs())
}

fn directional_movement(bar: &Bar, prev: &Bar) -> (f64, f64) {
    let up = bar.high - prev.high;
    let down = prev.low - bar.low;
    let plus = if up > down && up > 0.0 { up } else { 0.0 };
    let minus = if down > up && down > 0.0 { down } else { 0.0 };
    (plus, minus)
}

fn directional_index(dm_sum: Option<f64>, tr_sum: Option<f64>) -> Option<f64> {
    match (dm_sum, tr_sum) {
        (Some(dm), Some(tr)) if tr != 0.0 => Some(100.0 * dm / tr),
        _ => None,
    }
}

impl Indicator for Adx {
    type Output = Vec<AdxPoint>;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<AdxPoint>, IndicatorError> {
        validate_bars(bars)?;
        let n = bars.len();

        let mut tr = vec![None; n];
        let mut plus_dm = vec![None; n];
        let mut minus_dm = vec![None; n];
        for i in 1..n {
            let (plus, minus) = directional_movement(&bars[i], &bars[i - 1]);
            tr[i] = Some(true_range(&bars[i], &bars[i - 1]));
            plus_dm[i] = Some(plus);
            minus_dm[i] = Some(minus);
        }

        let tr_sum = rolling_sum(&tr, self.period);
        let plus_sum = rolling_sum(&plus_dm, self.period);
        let minus_sum = rolling_sum(&minus_dm, self.period);

        let plus_di: Vec<_> = (0..n)
            .map(|i| directional_index(plus_sum[i], tr_sum[i]))
            .collect();
        let minus_di: Vec<_> = (0..n)
            .map(|i| directional_index(minus_sum[i], tr_sum[i]))
            .collect();

        let dx: Vec<_> = (0..n)
            .map(|i| match (plus_di[i], minus_di[i]) {
                (Some(p), Some(m)) if p + m != 0.0 => Some(100.0 * (p - m).abs() / (p + m)),
                _ => None,
            })
            .collect();

        let adx = rolling_mean(&dx, self.period);

        Ok((0..n)
            .map(|i| AdxPoint {
                time: bars[i].time,
                true_range: tr[i],
                plus_dm: plus_dm[i],
                minus_dm: minus_dm[i],
                plus_di: plus_di[i],
                minus_di: minus_di[i],
                dx: dx[i],
                adx: adx[i],
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars};

    fn hand_worked() -> Vec<Bar> {
        make_ohlc_bars(&[
            (9.0, 10.0, 8.0, 9.0),
            (11.0, 12.0, 9.0, 11.0),
            (13.0, 14.0, 11.0, 13.0),
            (11.0, 13.0, 10.0, 11.0),
        ])
    }

    #[test]
    fn adx_hand_worked_period_two() {
        let points = Adx::new(2).unwrap().compute(&hand_worked()).unwrap();

        assert_eq!(points[0].true_range, None);
        assert_eq!(points[1].true_range, Some(3.0));
        assert_eq!(points[1].plus_dm, Some(2.0));
        assert_eq!(points[3].minus_dm, Some(1.0));

        // bar 2: +DI = 100 * 4 / 6, -DI = 0, DX = 100
        assert_approx(points[2].plus_di.unwrap(), 200.0 / 3.0, 1e-9);
        assert_approx(points[2].dx.unwrap(), 100.0, 1e-9);
        // bar 3: +DI = 100 * 2 / 6, -DI = 100 * 1 / 6, DX = 100 / 3
        assert_approx(points[3].dx.unwrap(), 100.0 / 3.0, 1e-9);

        assert_eq!(points[2].adx, None);
        assert_approx(points[3].adx.unwrap(), (100.0 + 100.0 / 3.0) / 2.0, 1e-9);
    }

    #[test]
    fn adx_first_defined_index_is_lookback() {
        let mut data = Vec::new();
        for i in 0..40 {
            let base = 100.0 + i as f64 * 2.0 + if i % 3 == 0 { -3.0 } else { 0.0 };
            data.push((base, base + 2.0, base - 2.0, base + 1.0));
        }
        let bars = make_ohlc_bars(&data);
        let adx = Adx::new(5).unwrap();
        let points = adx.compute(&bars).unwrap();
        let first = points.iter().position(|p| p.adx.is_some()).unwrap();
        assert_eq!(first, adx.lookback());
        assert_eq!(adx.lookback(), 9);
    }

    #[test]
    fn adx_bounds() {
        let bars = make_ohlc_bars(&[
            (100.0, 105.0, 95.0, 102.0),
            (102.0, 108.0, 100.0, 106.0),
            (106.0, 107.0, 98.0, 99.0),
            (99.0, 103.0, 97.0, 101.0),
            (101.0, 106.0, 100.0, 105.0),
            (105.0, 110.0, 103.0, 108.0),
            (108.0, 112.0, 106.0, 110.0),
            (110.0, 111.0, 104.0, 105.0),
            (105.0, 109.0, 103.0, 107.0),
            (107.0, 113.0, 105.0, 112.0),
        ]);
        let points = Adx::new(3).unwrap().compute(&bars).unwrap();
        for (i, p) in points.iter().enumerate() {
            if let Some(v) = p.adx {
                assert!((0.0..=100.0).contains(&v), "ADX out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn adx_strong_trend_elevated() {
        let data: Vec<_> = (0..20)
            .map(|i| {
                let base = 100.0 + i as f64 * 5.0;
                (base - 1.0, base + 3.0, base - 3.0, base + 2.0)
            })
            .collect();
        let points = Adx::new(5).unwrap().compute(&make_ohlc_bars(&data)).unwrap();
        let last = points.last().and_then(|p| p.adx).unwrap();
        assert!(last > 50.0, "ADX should be elevated in a one-way trend, got {last}");
    }

    #[test]
    fn adx_flat_series_is_undefined() {
        let bars = make_ohlc_bars(&[(1.0, 1.0, 1.0, 1.0); 12]);
        let points = Adx::new(3).unwrap().compute(&bars).unwrap();
        assert!(points.iter().all(|p| p.plus_di.is_none() && p.adx.is_none()));
    }

    #[test]
    fn adx_too_few_bars() {
        let bars = make_ohlc_bars(&[(100.0, 105.0, 95.0, 102.0)]);
        let points = Adx::new(3).unwrap().compute(&bars).unwrap();
        assert_eq!(points.len(), 1);
        assert!(points[0].adx.is_none());
    }

    #[test]
    fn adx_zero_period_rejected() {
        assert!(matches!(
            Adx::new(0),
            Err(IndicatorError::InvalidParameter { name: "adx_period", .. })
        ));
    }
}
