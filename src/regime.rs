//! Classifies price trend, volatility and flow condition from the mid
//! price history and the OAD/VAD reports (SPEC_FULL.md §4.8).

use crate::features::FeatureVector;
use crate::level::AlertLevel;
use crate::oad::OadReport;
use crate::time::Timestamp;
use crate::vad::VadReport;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const MAX_HISTORY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceRegime {
    TrendUp,
    TrendDown,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolRegime {
    HighVol,
    NormalVol,
    LowVol,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowRegime {
    Calm,
    Active,
    Toxic,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegimeState {
    pub timestamp: Timestamp,
    pub price_regime: PriceRegime,
    pub vol_regime: VolRegime,
    pub flow_regime: FlowRegime,
    pub confidence: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

pub struct RegimeClassifier {
    history: VecDeque<(Timestamp, f64)>,
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl RegimeClassifier {
    pub fn new() -> Self {
        Self {
            history: VecDeque::new(),
        }
    }

    pub fn observe(&mut self, timestamp: Timestamp, mid: f64) {
        self.history.push_back((timestamp, mid));
        while self.history.len() > MAX_HISTORY {
            self.history.pop_front();
        }
    }

    pub fn classify(&self, oad: &OadReport, vad: &VadReport, features: &FeatureVector) -> RegimeState {
        let toxic = features.toxic;
        let n = self.history.len();
        let mids: Vec<f64> = self.history.iter().map(|&(_, m)| m).collect();
        let now = self.history.back().map(|&(ts, _)| ts).unwrap_or(0.0);

        let price_regime = if n < 20 {
            PriceRegime::Range
        } else {
            let short = mean(&mids[n - 10..]);
            let long = mean(&mids[n - 30.min(n)..]);
            if short > 1.002 * long {
                PriceRegime::TrendUp
            } else if short < 0.998 * long {
                PriceRegime::TrendDown
            } else {
                PriceRegime::Range
            }
        };

        let vol_regime = if n < 2 {
            VolRegime::NormalVol
        } else {
            let returns: Vec<f64> = mids
                .windows(2)
                .filter(|w| w[0] > 0.0)
                .map(|w| (w[1] - w[0]) / w[0])
                .collect();
            let realized_vol = if returns.len() > 1 {
                let mu = mean(&returns);
                let var = returns.iter().map(|r| (r - mu).powi(2)).sum::<f64>() / (returns.len() as f64 - 1.0);
                var.sqrt() * (252.0f64 * 86_400.0).sqrt()
            } else {
                0.0
            };
            if realized_vol > 0.5 {
                VolRegime::HighVol
            } else if realized_vol < 0.2 {
                VolRegime::LowVol
            } else {
                VolRegime::NormalVol
            }
        };

        let max_impact = features.impact_buy_bps.max(features.impact_sell_bps);
        let vol_z = vad.triggers.get("vol_z").copied().unwrap_or(0.0);

        let flow_regime = if toxic >= 0.6 || oad.level == AlertLevel::Danger || max_impact > 20.0 {
            FlowRegime::Toxic
        } else if vol_z >= 4.0 || oad.level == AlertLevel::Warn {
            FlowRegime::Active
        } else {
            FlowRegime::Calm
        };

        let confidence = if n >= 50 {
            0.8
        } else if n >= 20 {
            0.6
        } else {
            0.4
        };

        RegimeState {
            timestamp: now,
            price_regime,
            vol_regime,
            flow_regime,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn oad(level: AlertLevel) -> OadReport {
        OadReport {
            timestamp: 0.0,
            level,
            score: 0.0,
            triggers: HashMap::new(),
            liquidity_state: crate::oad::LiquidityState::Thick,
            gap_flag: false,
        }
    }

    fn vad(level: AlertLevel) -> VadReport {
        VadReport {
            timestamp: 0.0,
            level,
            score: 0.0,
            triggers: HashMap::new(),
            events: Default::default(),
            toxic: 0.0,
        }
    }

    fn features(toxic: f64) -> FeatureVector {
        FeatureVector {
            timestamp: 0.0,
            mid: 2000.0,
            spread: 1.0,
            spread_bps: 5.0,
            top_bid_sz: 10.0,
            top_ask_sz: 10.0,
            depth_bid_k: 50_000.0,
            depth_ask_k: 50_000.0,
            imb_k: 0.0,
            micro_minus_mid: 0.0,
            impact_buy_bps: 5.0,
            impact_sell_bps: 5.0,
            msg_rate: 1.0,
            churn: 0.0,
            vol: 10.0,
            trades: 5,
            avg_trade: 2.0,
            max_trade: 5.0,
            signed_imb: toxic,
            toxic,
        }
    }

    #[test]
    fn fewer_than_20_points_is_range() {
        let mut rc = RegimeClassifier::new();
        for i in 0..10 {
            rc.observe(i as f64, 2000.0 + i as f64);
        }
        let state = rc.classify(&oad(AlertLevel::Ok), &vad(AlertLevel::Ok), &features(0.0));
        assert_eq!(state.price_regime, PriceRegime::Range);
        assert_eq!(state.confidence, 0.4);
    }

    #[test]
    fn ascending_series_is_trend_up() {
        let mut rc = RegimeClassifier::new();
        for i in 0..40 {
            rc.observe(i as f64, 2000.0 + i as f64 * 0.5);
        }
        let state = rc.classify(&oad(AlertLevel::Ok), &vad(AlertLevel::Ok), &features(0.0));
        assert_eq!(state.price_regime, PriceRegime::TrendUp);
    }

    #[test]
    fn toxic_flow_when_toxic_above_threshold() {
        let rc = RegimeClassifier::new();
        let state = rc.classify(&oad(AlertLevel::Ok), &vad(AlertLevel::Ok), &features(0.9));
        assert_eq!(state.flow_regime, FlowRegime::Toxic);
    }

    #[test]
    fn toxic_flow_when_max_impact_above_twenty_bps() {
        let rc = RegimeClassifier::new();
        let mut f = features(0.0);
        f.impact_buy_bps = 25.0;
        let state = rc.classify(&oad(AlertLevel::Ok), &vad(AlertLevel::Ok), &f);
        assert_eq!(state.flow_regime, FlowRegime::Toxic);
    }

    #[test]
    fn confidence_scales_with_history_depth() {
        let mut rc = RegimeClassifier::new();
        for i in 0..60 {
            rc.observe(i as f64, 2000.0);
        }
        let state = rc.classify(&oad(AlertLevel::Ok), &vad(AlertLevel::Ok), &features(0.0));
        assert_eq!(state.confidence, 0.8);
    }
}
