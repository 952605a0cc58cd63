//! VWAP — volume-weighted average price on daily and weekly windows.
//!
//! Single O(n) pass with two running (sum of typical price × volume, sum of
//! volume) pairs. The daily pair resets when the calendar date changes from
//! the previous bar; the weekly pair resets when the ISO week (Monday start)
//! changes. Undefined while the active window has no volume.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::{Indicator, IndicatorError};
use crate::domain::series::validate_bars;
use crate::domain::Bar;

/// VWAP values at one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VwapPoint {
    pub time: NaiveDateTime,
    pub daily: Option<f64>,
    pub weekly: Option<f64>,
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

/// Running TPV/volume pair keyed by a period start.
#[derive(Debug, Default)]
struct Accumulator {
    period: Option<NaiveDate>,
    tpv: f64,
    volume: f64,
}

impl Accumulator {
    fn add(&mut self, period: NaiveDate, typical_price: f64, volume: f64) -> Option<f64> {
        if self.period != Some(period) {
            self.period = Some(period);
            self.tpv = 0.0;
            self.volume = 0.0;
        }
        self.tpv += typical_price * volume;
        self.volume += volume;
        if self.volume > 0.0 {
            Some(self.tpv / self.volume)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Vwap;

impl Vwap {
    pub fn new() -> Self {
        Self
    }
}

impl Indicator for Vwap {
    type Output = Vec<VwapPoint>;

    fn name(&self) -> &str {
        "vwap"
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Result<Vec<VwapPoint>, IndicatorError> {
        validate_bars(bars)?;

        let mut daily = Accumulator::default();
        let mut weekly = Accumulator::default();

        Ok(bars
            .iter()
            .map(|bar| {
                let date = bar.time.date();
                let tp = bar.typical_price();
                let volume = bar.effective_volume();
                VwapPoint {
                    time: bar.time,
                    daily: daily.add(date, tp, volume),
                    weekly: weekly.add(week_start(date), tp, volume),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesError;
    use crate::indicators::{assert_approx, make_ohlc_bars, DEFAULT_EPSILON};

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn bar(time: NaiveDateTime, high: f64, low: f64, close: f64, volume: f64) -> Bar {
        Bar {
            time,
            open: close,
            high,
            low,
            close,
            tick_volume: volume,
            real_volume: 0.0,
        }
    }

    #[test]
    fn single_day_daily_equals_weekly_and_cumulative_average() {
        let bars = vec![
            bar(at(2024, 3, 5, 9), 11.0, 9.0, 10.0, 100.0),
            bar(at(2024, 3, 5, 10), 13.0, 11.0, 12.0, 300.0),
            bar(at(2024, 3, 5, 11), 12.0, 8.0, 10.0, 100.0),
        ];
        let points = Vwap.compute(&bars).unwrap();

        let mut tpv = 0.0;
        let mut vol = 0.0;
        for (p, b) in points.iter().zip(&bars) {
            tpv += b.typical_price() * b.tick_volume;
            vol += b.tick_volume;
            assert_eq!(p.daily, p.weekly);
            assert_approx(p.daily.unwrap(), tpv / vol, DEFAULT_EPSILON);
        }
        // (10*100 + 12*300 + 10*100) / 500 = 11.2
        assert_approx(points[2].daily.unwrap(), 11.2, DEFAULT_EPSILON);
    }

    #[test]
    fn daily_resets_weekly_blends_within_week() {
        // Tuesday and Wednesday of the same ISO week
        let bars = vec![
            bar(at(2024, 3, 5, 16), 11.0, 9.0, 10.0, 100.0),
            bar(at(2024, 3, 6, 9), 21.0, 19.0, 20.0, 100.0),
        ];
        let points = Vwap.compute(&bars).unwrap();
        assert_approx(points[1].daily.unwrap(), 20.0, DEFAULT_EPSILON);
        assert_approx(points[1].weekly.unwrap(), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn weekly_resets_on_monday() {
        // Friday then the following Monday
        let bars = vec![
            bar(at(2024, 3, 8, 16), 11.0, 9.0, 10.0, 100.0),
            bar(at(2024, 3, 11, 9), 21.0, 19.0, 20.0, 100.0),
        ];
        let points = Vwap.compute(&bars).unwrap();
        assert_approx(points[1].daily.unwrap(), 20.0, DEFAULT_EPSILON);
        assert_approx(points[1].weekly.unwrap(), 20.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_volume_is_undefined_until_volume_arrives() {
        let bars = vec![
            bar(at(2024, 3, 5, 9), 11.0, 9.0, 10.0, 0.0),
            bar(at(2024, 3, 5, 10), 13.0, 11.0, 12.0, 50.0),
        ];
        let points = Vwap.compute(&bars).unwrap();
        assert_eq!(points[0].daily, None);
        assert_eq!(points[0].weekly, None);
        assert_approx(points[1].daily.unwrap(), 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn falls_back_to_real_volume() {
        let mut bars = vec![
            bar(at(2024, 3, 5, 9), 11.0, 9.0, 10.0, 0.0),
            bar(at(2024, 3, 5, 10), 21.0, 19.0, 20.0, 100.0),
        ];
        bars[0].real_volume = 100.0;
        let points = Vwap.compute(&bars).unwrap();
        assert_approx(points[1].daily.unwrap(), 15.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rejects_unsorted_series() {
        let mut bars = make_ohlc_bars(&[(1.0, 1.1, 0.9, 1.0), (1.0, 1.1, 0.9, 1.0)]);
        bars.reverse();
        let err = Vwap.compute(&bars).unwrap_err();
        assert!(matches!(
            err,
            IndicatorError::InvalidInput(SeriesError::UnsortedTimestamps { .. })
        ));
    }

    #[test]
    fn rejects_negative_volume() {
        let mut bars = make_ohlc_bars(&[(1.0, 1.1, 0.9, 1.0)]);
        bars[0].tick_volume = -5.0;
        assert!(Vwap.compute(&bars).is_err());
    }

    #[test]
    fn empty_series_yields_no_points() {
        assert!(Vwap.compute(&[]).unwrap().is_empty());
    }

    #[test]
    fn week_start_is_monday() {
        let sunday = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        assert_eq!(week_start(sunday), monday);
        assert_eq!(week_start(monday), monday);
    }
}
