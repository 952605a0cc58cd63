//! Look-ahead contamination tests for the indicator engine.
//!
//! Invariant: no indicator value at bar t may depend on price data from bar
//! t+1 or later.
//!
//! Method: compute on a truncated series (bars 0..300) and the full series
//! (bars 0..600). Values for bars 0..300 must be identical between both runs.

use chrono::NaiveDate;
use cyclesig_core::domain::Bar;
use cyclesig_core::indicators::{Adx, Indicator, PivotParams, Pivots, Vwap};

/// Generate N five-minute bars with a deterministic pseudo-random walk that
/// spans several days and a week boundary.
fn make_test_bars(n: usize) -> Vec<Bar> {
    let base = NaiveDate::from_ymd_opt(2024, 3, 7)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut bars = Vec::with_capacity(n);
    let mut price = 1.1;

    for i in 0..n {
        let seed = (i as u64).wrapping_mul(6364136223846793005).wrapping_add(1);
        let change = ((seed % 200) as f64 - 100.0) * 0.00002;
        price = (price + change).max(0.5);

        let open = price - 0.0001;
        let close = price + 0.00005;
        bars.push(Bar {
            time: base + chrono::Duration::minutes(5 * i as i64 * 3),
            open,
            high: open.max(close) + 0.0003,
            low: open.min(close) - 0.0003,
            close,
            tick_volume: 100.0 + (i % 13) as f64 * 10.0,
            real_volume: 0.0,
        });
    }
    bars
}

const FULL: usize = 600;
const TRUNCATED: usize = 300;

#[test]
fn vwap_no_lookahead() {
    let bars = make_test_bars(FULL);
    let full = Vwap::new().compute(&bars).unwrap();
    let truncated = Vwap::new().compute(&bars[..TRUNCATED]).unwrap();
    assert_eq!(truncated.len(), TRUNCATED);
    assert_eq!(&full[..TRUNCATED], truncated.as_slice());
}

#[test]
fn adx_no_lookahead() {
    let bars = make_test_bars(FULL);
    for period in [3, 14, 30] {
        let adx = Adx::new(period).unwrap();
        let full = adx.compute(&bars).unwrap();
        let truncated = adx.compute(&bars[..TRUNCATED]).unwrap();
        assert_eq!(&full[..TRUNCATED], truncated.as_slice(), "{}", adx.name());
    }
}

#[test]
fn adx_depends_only_on_trailing_window() {
    // Plain rolling sums: the value at t is fixed by bars t-2p+1..=t.
    let bars = make_test_bars(FULL);
    let adx = Adx::new(14).unwrap();
    let full = adx.compute(&bars).unwrap();
    let start = FULL - 2 * 14;
    let tail = adx.compute(&bars[start..]).unwrap();
    let a = full.last().and_then(|p| p.adx).unwrap();
    let b = tail.last().and_then(|p| p.adx).unwrap();
    assert!((a - b).abs() < 1e-9, "full={a}, tail={b}");
}

#[test]
fn pivots_confirmed_only_after_half_group() {
    // A pivot at bar i is known once bar i + half_group exists; a truncated
    // run must agree with the full run on every pivot it could have seen.
    let bars = make_test_bars(FULL);
    let params = PivotParams {
        window: FULL,
        half_group: 3,
        min_prominence: 0.0,
    };
    let pivots = Pivots::new(params).unwrap();
    let full = pivots.compute(&bars).unwrap();
    let truncated = pivots.compute(&bars[..TRUNCATED]).unwrap();

    let horizon = bars[TRUNCATED - 1 - params.half_group].time;
    let seen = |set: &[cyclesig_core::indicators::Pivot]| {
        set.iter()
            .filter(|p| p.time <= horizon)
            .copied()
            .collect::<Vec<_>>()
    };
    assert_eq!(seen(&full.tops), truncated.tops);
    assert_eq!(seen(&full.bottoms), truncated.bottoms);
}
