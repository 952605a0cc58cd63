//! Admission filters. Each returns `None` when the evaluation may continue,
//! or the [`Suppression`] that ends it along with the values it looked at.

use chrono::NaiveTime;
use chrono::Timelike;

use super::{PipelineParams, SuppressReason, Suppression};
use crate::domain::{Bar, InstrumentConfig};

fn seconds(t: NaiveTime) -> f64 {
    f64::from(t.num_seconds_from_midnight())
}

/// Time of day must fall inside the instrument's inclusive trading window.
pub fn trading_window(config: &InstrumentConfig, time_of_day: NaiveTime) -> Option<Suppression> {
    if config.in_trading_window(time_of_day) {
        return None;
    }
    Some(
        Suppression::new(SuppressReason::OutsideTradingWindow)
            .with("time_of_day_secs", seconds(time_of_day))
            .with("start_secs", seconds(config.trading_start))
            .with("end_secs", seconds(config.trading_end)),
    )
}

/// Suppress only inside the band `neutral_ceiling < adx < adx_min`.
///
/// An ADX at or below the ceiling is inconclusive and passes.
pub fn trend_strength(
    config: &InstrumentConfig,
    params: &PipelineParams,
    adx: f64,
) -> Option<Suppression> {
    if adx > params.adx_neutral_ceiling && adx < config.adx_min {
        return Some(
            Suppression::new(SuppressReason::WeakTrend)
                .with("adx", adx)
                .with("neutral_ceiling", params.adx_neutral_ceiling)
                .with("adx_min", config.adx_min),
        );
    }
    None
}

/// Reject a current bar whose body exceeds the configured percentage of its open.
pub fn candle_body(config: &InstrumentConfig, body_pct: f64) -> Option<Suppression> {
    if body_pct > config.max_body_pct {
        return Some(
            Suppression::new(SuppressReason::AnomalousCandle)
                .with("body_pct", body_pct)
                .with("max_body_pct", config.max_body_pct),
        );
    }
    None
}

/// Reject a close too far, relative to it, from the daily VWAP.
pub fn vwap_distance(params: &PipelineParams, close: f64, vwap: f64) -> Option<Suppression> {
    let distance = (close - vwap).abs() / vwap;
    if distance > params.vwap_max_distance {
        return Some(
            Suppression::new(SuppressReason::FarFromVwap)
                .with("close", close)
                .with("vwap", vwap)
                .with("distance", distance)
                .with("max_distance", params.vwap_max_distance),
        );
    }
    None
}

/// Candle-body percentage of a bar, or the suppression for a bar without one.
pub fn body_pct(bar: &Bar) -> Result<f64, Suppression> {
    bar.body_pct()
        .ok_or_else(|| Suppression::new(SuppressReason::InsufficientData("candle_body")))
}
