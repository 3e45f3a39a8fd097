//! The flat policy record an external collaborator loads from TOML/JSON/env
//! and hands to the core. The core never reads a file or environment
//! variable itself; it only deserializes, defaults, and validates.

use crate::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Closed enumeration of strategy tags a [`crate::signal_engine::SignalEngine`]
/// can emit. Unknown string tags in a deserialized policy are rejected by
/// [`Policy::validate`] rather than discovered at runtime (REDESIGN FLAGS).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyTag {
    TrendBreakout,
    RangeMeanRevert,
}

impl StrategyTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::TrendBreakout => "trend_breakout",
            StrategyTag::RangeMeanRevert => "range_mean_revert",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OadConfig {
    pub z_warn: f64,
    pub z_danger: f64,
}

impl Default for OadConfig {
    fn default() -> Self {
        Self {
            z_warn: 4.0,
            z_danger: 6.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    pub z_warn: f64,
    pub z_danger: f64,
    pub toxic_warn: f64,
    pub toxic_danger: f64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            z_warn: 4.0,
            z_danger: 6.0,
            toxic_warn: 0.6,
            toxic_danger: 0.75,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturesConfig {
    pub impact_size_quote_usd: f64,
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            impact_size_quote_usd: 1000.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub slicing_threshold_bps: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            slicing_threshold_bps: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionConfig {
    pub max_hold_time_sec: f64,
}

impl Default for PositionConfig {
    fn default() -> Self {
        Self {
            max_hold_time_sec: 3600.0,
        }
    }
}

/// Derives `Deserialize` so an external collaborator can populate it;
/// `validate()` is the one place a fatal, construction-time error
/// originates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub max_daily_loss_pct: f64,
    pub max_position_notional: f64,
    pub max_trades_per_hour: u32,
    pub impact_hard_cap_bps: f64,
    pub impact_entry_cap_bps: f64,
    pub allowed_strategies: HashSet<StrategyTag>,
    pub oad: OadConfig,
    pub vad: VadConfig,
    pub features: FeaturesConfig,
    pub execution: ExecutionConfig,
    pub position: PositionConfig,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            max_daily_loss_pct: 1.0,
            max_position_notional: 3000.0,
            max_trades_per_hour: 6,
            impact_hard_cap_bps: 20.0,
            impact_entry_cap_bps: 10.0,
            allowed_strategies: [StrategyTag::TrendBreakout, StrategyTag::RangeMeanRevert]
                .into_iter()
                .collect(),
            oad: OadConfig::default(),
            vad: VadConfig::default(),
            features: FeaturesConfig::default(),
            execution: ExecutionConfig::default(),
            position: PositionConfig::default(),
        }
    }
}

impl Policy {
    /// Rejects out-of-range thresholds at construction time. This is the one
    /// case where a fatal error is appropriate.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let checks: &[(&'static str, f64, f64, f64)] = &[
            ("max_daily_loss_pct", self.max_daily_loss_pct, 0.0, 100.0),
            (
                "max_position_notional",
                self.max_position_notional,
                0.0,
                f64::MAX,
            ),
            (
                "impact_hard_cap_bps",
                self.impact_hard_cap_bps,
                0.0,
                f64::MAX,
            ),
            (
                "impact_entry_cap_bps",
                self.impact_entry_cap_bps,
                0.0,
                self.impact_hard_cap_bps.max(0.0),
            ),
            ("oad.z_warn", self.oad.z_warn, 0.0, self.oad.z_danger),
            ("vad.z_warn", self.vad.z_warn, 0.0, self.vad.z_danger),
            (
                "vad.toxic_warn",
                self.vad.toxic_warn,
                0.0,
                self.vad.toxic_danger,
            ),
            (
                "execution.slicing_threshold_bps",
                self.execution.slicing_threshold_bps,
                0.0,
                f64::MAX,
            ),
            (
                "position.max_hold_time_sec",
                self.position.max_hold_time_sec,
                0.0,
                f64::MAX,
            ),
        ];
        for (field, value, lo, hi) in checks {
            if !(*lo..=*hi).contains(value) {
                return Err(PolicyError::OutOfRange {
                    field,
                    value: *value,
                });
            }
        }
        if self.max_trades_per_hour == 0 {
            return Err(PolicyError::OutOfRange {
                field: "max_trades_per_hour",
                value: 0.0,
            });
        }
        Ok(())
    }
}

/// Per-component window/threshold parameters that aren't part of the
/// risk policy proper but still need to be overridable without touching
/// component internals.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tape_span_sec: f64,
    pub oad_short_window_sec: f64,
    pub oad_long_window_sec: f64,
    pub vad_window_sec: f64,
    /// Tape aggregation lookback `FeatureEngine` uses for `vol`/`trades`/
    /// `toxic` (SPEC_FULL.md §4.4's 60s default).
    pub tape_feature_window_sec: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tape_span_sec: 300.0,
            oad_short_window_sec: 300.0,
            oad_long_window_sec: 3600.0,
            vad_window_sec: 300.0,
            tape_feature_window_sec: 60.0,
        }
    }
}
