//! Orderbook anomaly detector: z-scores spread/impact/message-rate and
//! flags liquidity gaps against a long-window depth median.

use crate::features::FeatureVector;
use crate::level::AlertLevel;
use crate::policy::OadConfig;
use crate::rolling_mad::RollingMad;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityState {
    Thick,
    Thin,
    Toxic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OadReport {
    pub timestamp: Timestamp,
    pub level: AlertLevel,
    pub score: f64,
    pub triggers: HashMap<String, f64>,
    pub liquidity_state: LiquidityState,
    pub gap_flag: bool,
}

pub struct OrderbookAnomalyDetector {
    short: RollingMad,
    long: RollingMad,
    config: OadConfig,
}

impl OrderbookAnomalyDetector {
    pub fn new(short_window_sec: f64, long_window_sec: f64, config: OadConfig) -> Self {
        Self {
            short: RollingMad::new(short_window_sec),
            long: RollingMad::new(long_window_sec),
            config,
        }
    }

    pub fn update(&mut self, features: &FeatureVector) -> OadReport {
        let ts = features.timestamp;
        let spread_stats = self.short.update("spread_bps", ts, features.spread_bps);
        let impact_buy_stats = self.short.update("impact_buy", ts, features.impact_buy_bps);
        let impact_sell_stats = self.short.update("impact_sell", ts, features.impact_sell_bps);
        let msg_rate_stats = self.short.update("msg_rate", ts, features.msg_rate);

        let depth_bid_stats = self.long.update("depth_bid", ts, features.depth_bid_k);
        let depth_ask_stats = self.long.update("depth_ask", ts, features.depth_ask_k);

        let gap_flag = (depth_bid_stats.count >= 2 && features.depth_bid_k < 0.5 * depth_bid_stats.median)
            || (depth_ask_stats.count >= 2 && features.depth_ask_k < 0.5 * depth_ask_stats.median);

        let z_impact = impact_buy_stats.z.max(impact_sell_stats.z);
        let score = 0.3 * spread_stats.z
            + 0.4 * z_impact
            + 0.2 * msg_rate_stats.z
            + if gap_flag { 10.0 } else { 0.0 };

        let level = if score >= self.config.z_danger || gap_flag {
            AlertLevel::Danger
        } else if score >= self.config.z_warn {
            AlertLevel::Warn
        } else {
            AlertLevel::Ok
        };

        let max_impact = features.impact_buy_bps.max(features.impact_sell_bps);
        let liquidity_state = if max_impact > 20.0 || features.toxic > 0.75 {
            LiquidityState::Toxic
        } else if max_impact > 10.0 {
            LiquidityState::Thin
        } else {
            LiquidityState::Thick
        };

        let mut triggers = HashMap::new();
        triggers.insert("z_spread".to_string(), spread_stats.z);
        triggers.insert("z_impact_buy".to_string(), impact_buy_stats.z);
        triggers.insert("z_impact_sell".to_string(), impact_sell_stats.z);
        triggers.insert("z_msg_rate".to_string(), msg_rate_stats.z);
        triggers.insert("gap_flag".to_string(), if gap_flag { 1.0 } else { 0.0 });

        OadReport {
            timestamp: ts,
            level,
            score,
            triggers,
            liquidity_state,
            gap_flag,
        }
    }
}
