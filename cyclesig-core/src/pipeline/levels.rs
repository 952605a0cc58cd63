//! Stop-loss / take-profit placement from pivots.

use crate::domain::Direction;
use crate::indicators::{PivotSet, PRICE_TOLERANCE};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Levels {
    pub stop: f64,
    pub target: f64,
    /// Absolute distance between entry and stop.
    pub risk: f64,
}

/// Place the stop on the most recent pivot beyond `price` that is at least
/// `min_distance` away: bottoms below price for longs, tops above for shorts.
/// The target sits `reward_risk` times that distance on the other side.
pub fn stop_and_target(
    direction: Direction,
    price: f64,
    pivots: &PivotSet,
    min_distance: f64,
    reward_risk: f64,
) -> Option<Levels> {
    match direction {
        Direction::Long => pivots
            .bottoms
            .iter()
            .rev()
            .filter(|p| p.price < price)
            .find(|p| price - p.price + PRICE_TOLERANCE >= min_distance)
            .map(|p| {
                let risk = price - p.price;
                Levels {
                    stop: p.price,
                    target: price + reward_risk * risk,
                    risk,
                }
            }),
        Direction::Short => pivots
            .tops
            .iter()
            .rev()
            .filter(|p| p.price > price)
            .find(|p| p.price - price + PRICE_TOLERANCE >= min_distance)
            .map(|p| {
                let risk = p.price - price;
                Levels {
                    stop: p.price,
                    target: price - reward_risk * risk,
                    risk,
                }
            }),
    }
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::Pivot;
    use chrono::NaiveDate;

    fn set(tops: &[f64], bottoms: &[f64]) -> PivotSet {
        let base = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mk = |prices: &[f64]| {
            prices
                .iter()
                .enumerate()
                .map(|(i, &price)| Pivot {
                    time: base + chrono::Duration::hours(i as i64),
                    price,
                })
                .collect()
        };
        PivotSet {
            tops: mk(tops),
            bottoms: mk(bottoms),
        }
    }

    #[test]
    fn long_uses_most_recent_qualifying_bottom() {
        // Newest bottom (1.0995) is too close; next newest (1.0990) qualifies.
        let pivots = set(&[], &[1.0980, 1.0990, 1.0995]);
        let levels = stop_and_target(Direction::Long, 1.1, &pivots, 0.0007, 2.0).unwrap();
        assert_eq!(levels.stop, 1.0990);
        assert!((levels.target - 1.102).abs() < 1e-12);
    }

    #[test]
    fn long_ignores_bottoms_above_price() {
        let pivots = set(&[], &[1.0980, 1.2000]);
        let levels = stop_and_target(Direction::Long, 1.1, &pivots, 0.0003, 2.0).unwrap();
        assert_eq!(levels.stop, 1.0980);
    }

    #[test]
    fn short_mirrors_long() {
        let pivots = set(&[1.1020, 1.1005], &[]);
        let levels = stop_and_target(Direction::Short, 1.1, &pivots, 0.001, 2.0).unwrap();
        assert_eq!(levels.stop, 1.1020);
        assert!((levels.target - 1.096).abs() < 1e-12);
    }

    #[test]
    fn distance_equal_to_minimum_qualifies_on_decimal_prices() {
        // 1.1005 - 1.1 falls a few ulps short of 0.0005.
        let pivots = set(&[1.1005], &[1.1]);
        let long = stop_and_target(Direction::Long, 1.1005, &pivots, 0.0005, 2.0).unwrap();
        assert_eq!(long.stop, 1.1);
        let short = stop_and_target(Direction::Short, 1.1, &pivots, 0.0005, 2.0).unwrap();
        assert_eq!(short.stop, 1.1005);
    }

    #[test]
    fn no_qualifying_pivot() {
        let pivots = set(&[1.1001], &[1.0999]);
        assert!(stop_and_target(Direction::Long, 1.1, &pivots, 0.0003, 2.0).is_none());
        assert!(stop_and_target(Direction::Short, 1.1, &pivots, 0.0003, 2.0).is_none());
        assert!(stop_and_target(Direction::Long, 1.1, &PivotSet::default(), 0.0, 2.0).is_none());
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(1.234567, 5), 1.23457);
        assert_eq!(round_to(27.456, 2), 27.46);
    }
}
