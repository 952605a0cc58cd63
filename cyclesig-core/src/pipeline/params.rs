//! Pipeline thresholds shared by every instrument.

use serde::{Deserialize, Serialize};

use crate::cycle::CycleRule;
use crate::indicators::{IndicatorError, PivotParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineParams {
    pub adx_period: usize,
    /// ADX at or below this value is inconclusive and never suppresses.
    pub adx_neutral_ceiling: f64,
    /// Maximum relative distance of close from the daily VWAP.
    pub vwap_max_distance: f64,
    pub pivots: PivotParams,
    /// Minimum price distance between entry and stop, quoted for a
    /// 0.0001-point instrument and scaled by the instrument's point.
    pub stop_min_distance: f64,
    pub reward_risk: f64,
    pub duplicate_lookback_minutes: i64,
    /// Decimals kept on stop and target.
    pub price_decimals: u32,
    pub cycle_rule: CycleRule,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            adx_period: 14,
            adx_neutral_ceiling: 20.0,
            vwap_max_distance: 0.005,
            pivots: PivotParams::default(),
            stop_min_distance: 0.0003,
            reward_risk: 2.0,
            duplicate_lookback_minutes: 60,
            price_decimals: 5,
            cycle_rule: CycleRule::ThreePivot,
        }
    }
}

/// One year.
const MAX_LOOKBACK_MINUTES: i64 = 525_600;

fn invalid(name: &'static str, reason: String) -> IndicatorError {
    IndicatorError::InvalidParameter { name, reason }
}

impl PipelineParams {
    pub fn validate(&self) -> Result<(), IndicatorError> {
        if self.adx_period == 0 {
            return Err(invalid("adx_period", "must be >= 1".into()));
        }
        self.pivots.validate()?;
        for (name, value) in [
            ("adx_neutral_ceiling", self.adx_neutral_ceiling),
            ("vwap_max_distance", self.vwap_max_distance),
            ("stop_min_distance", self.stop_min_distance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("must be finite and >= 0, got {value}")));
            }
        }
        if !self.reward_risk.is_finite() || self.reward_risk <= 0.0 {
            return Err(invalid(
                "reward_risk",
                format!("must be > 0, got {}", self.reward_risk),
            ));
        }
        if !(0..=MAX_LOOKBACK_MINUTES).contains(&self.duplicate_lookback_minutes) {
            return Err(invalid(
                "duplicate_lookback_minutes",
                format!(
                    "must be within 0..={MAX_LOOKBACK_MINUTES}, got {}",
                    self.duplicate_lookback_minutes
                ),
            ));
        }
        if self.price_decimals > 10 {
            return Err(invalid(
                "price_decimals",
                format!("must be <= 10, got {}", self.price_decimals),
            ));
        }
        Ok(())
    }
}
