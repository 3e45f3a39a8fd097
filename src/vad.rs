//! Volume anomaly detector: z-scores volume/trade-count/largest-trade and
//! classifies burst/drought/whale events plus toxic flow (SPEC_FULL.md
//! §4.6).

use crate::features::FeatureVector;
use crate::level::AlertLevel;
use crate::policy::VadConfig;
use crate::rolling_mad::RollingMad;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VadEvents {
    pub burst: bool,
    pub drought: bool,
    pub whale: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadReport {
    pub timestamp: Timestamp,
    pub level: AlertLevel,
    pub score: f64,
    pub triggers: HashMap<String, f64>,
    pub events: VadEvents,
    pub toxic: f64,
}

pub struct VolumeAnomalyDetector {
    window: RollingMad,
    config: VadConfig,
}

impl VolumeAnomalyDetector {
    pub fn new(window_sec: f64, config: VadConfig) -> Self {
        Self {
            window: RollingMad::new(window_sec),
            config,
        }
    }

    pub fn update(&mut self, features: &FeatureVector) -> VadReport {
        let ts = features.timestamp;
        let log_vol = features.vol.ln_1p();
        let vol_stats = self.window.update("log_vol", ts, log_vol);
        let trades_stats = self.window.update("trades", ts, features.trades as f64);
        let max_trade_stats = self.window.update("max_trade", ts, features.max_trade);
        let _toxic_stats = self.window.update("toxic", ts, features.toxic);

        let burst = vol_stats.z >= self.config.z_warn;
        let drought = features.vol < 0.01 || vol_stats.z < -2.0;
        let whale = max_trade_stats.z >= self.config.z_warn;

        let score = 0.5 * vol_stats.z + 0.3 * max_trade_stats.z + 10.0 * features.toxic;

        let level = if score >= self.config.z_danger || features.toxic >= self.config.toxic_danger {
            AlertLevel::Danger
        } else if score >= self.config.z_warn || features.toxic >= self.config.toxic_warn {
            AlertLevel::Warn
        } else {
            AlertLevel::Ok
        };

        let mut triggers = HashMap::new();
        triggers.insert("vol_z".to_string(), vol_stats.z);
        triggers.insert("trades_z".to_string(), trades_stats.z);
        triggers.insert("max_trade_z".to_string(), max_trade_stats.z);

        VadReport {
            timestamp: ts,
            level,
            score,
            triggers,
            events: VadEvents {
                burst,
                drought,
                whale,
            },
            toxic: features.toxic,
        }
    }
}
