//! Rule-based strategies emitting trade candidates (SPEC_FULL.md §4.9).

use crate::candidate::{CandidateSide, TradeCandidate};
use crate::policy::{Policy, StrategyTag};
use crate::regime::{FlowRegime, PriceRegime, RegimeState};
use crate::time::Timestamp;
use std::collections::VecDeque;

const MAX_HISTORY: usize = 100;

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn std_dev(values: &[f64], mu: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / (values.len() as f64 - 1.0);
    var.sqrt()
}

pub struct SignalEngine {
    history: VecDeque<(Timestamp, f64)>,
}

impl Default for SignalEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalEngine {
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

    pub fn generate(&self, regime: &RegimeState, policy: &Policy) -> Option<TradeCandidate> {
        if regime.flow_regime == FlowRegime::Toxic {
            return None;
        }
        if policy.allowed_strategies.is_empty() {
            return None;
        }
        if self.history.len() < 5 {
            return None;
        }

        if let Some(c) = self.trend_breakout(regime, policy) {
            return Some(c);
        }
        self.range_mean_revert(regime, policy)
    }

    fn trend_breakout(&self, regime: &RegimeState, policy: &Policy) -> Option<TradeCandidate> {
        if !policy.allowed_strategies.contains(&StrategyTag::TrendBreakout) {
            return None;
        }
        let trending = matches!(regime.price_regime, PriceRegime::TrendUp | PriceRegime::TrendDown);
        if !trending || regime.flow_regime != FlowRegime::Active {
            return None;
        }
        let n = self.history.len();
        let window = &self
            .history
            .iter()
            .skip(n.saturating_sub(20))
            .map(|&(_, m)| m)
            .collect::<Vec<_>>();
        let recent_high = window.iter().cloned().fold(f64::MIN, f64::max);
        let recent_low = window.iter().cloned().fold(f64::MAX, f64::min);
        let (ts, mid) = *self.history.back()?;

        if mid > 1.001 * recent_high {
            return Some(TradeCandidate {
                side: CandidateSide::Long,
                entry: mid,
                stop: 0.995 * mid,
                tp: Some(1.01 * mid),
                confidence: 0.7,
                ttl_sec: 300.0,
                strategy: StrategyTag::TrendBreakout,
                generated_at: ts,
            });
        }
        if mid < 0.999 * recent_low {
            return Some(TradeCandidate {
                side: CandidateSide::Short,
                entry: mid,
                stop: 1.005 * mid,
                tp: Some(0.99 * mid),
                confidence: 0.7,
                ttl_sec: 300.0,
                strategy: StrategyTag::TrendBreakout,
                generated_at: ts,
            });
        }
        None
    }

    fn range_mean_revert(&self, regime: &RegimeState, policy: &Policy) -> Option<TradeCandidate> {
        if !policy.allowed_strategies.contains(&StrategyTag::RangeMeanRevert) {
            return None;
        }
        if regime.price_regime != PriceRegime::Range || regime.flow_regime != FlowRegime::Calm {
            return None;
        }
        let n = self.history.len();
        let window: Vec<f64> = self
            .history
            .iter()
            .skip(n.saturating_sub(30))
            .map(|&(_, m)| m)
            .collect();
        let mu = mean(&window);
        let sigma = std_dev(&window, mu);
        let (ts, mid) = *self.history.back()?;

        if mid < mu - 1.5 * sigma {
            return Some(TradeCandidate {
                side: CandidateSide::Long,
                entry: mid,
                stop: 0.998 * mid,
                tp: Some(mu),
                confidence: 0.6,
                ttl_sec: 600.0,
                strategy: StrategyTag::RangeMeanRevert,
                generated_at: ts,
            });
        }
        if mid > mu + 1.5 * sigma {
            return Some(TradeCandidate {
                side: CandidateSide::Short,
                entry: mid,
                stop: 1.002 * mid,
                tp: Some(mu),
                confidence: 0.6,
                ttl_sec: 600.0,
                strategy: StrategyTag::RangeMeanRevert,
                generated_at: ts,
            });
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regime::{FlowRegime, PriceRegime, RegimeState, VolRegime};
    use approx::assert_relative_eq;

    fn regime(price: PriceRegime, flow: FlowRegime) -> RegimeState {
        RegimeState {
            timestamp: 0.0,
            price_regime: price,
            vol_regime: VolRegime::NormalVol,
            flow_regime: flow,
            confidence: 0.8,
        }
    }

    #[test]
    fn toxic_flow_emits_nothing() {
        let mut engine = SignalEngine::new();
        for i in 0..10 {
            engine.observe(i as f64, 2000.0);
        }
        let c = engine.generate(&regime(PriceRegime::TrendUp, FlowRegime::Toxic), &Policy::default());
        assert!(c.is_none());
    }

    #[test]
    fn empty_allowed_strategies_emits_nothing() {
        let mut engine = SignalEngine::new();
        for i in 0..10 {
            engine.observe(i as f64, 2000.0);
        }
        let mut policy = Policy::default();
        policy.allowed_strategies.clear();
        let c = engine.generate(&regime(PriceRegime::TrendUp, FlowRegime::Active), &policy);
        assert!(c.is_none());
    }

    #[test]
    fn trend_breakout_long_fires_on_new_high() {
        let mut engine = SignalEngine::new();
        for i in 0..40u32 {
            engine.observe(i as f64, 2000.0 + i as f64 * 0.5);
        }
        // last mid = 2000 + 39*0.5 = 2019.5; bump an explicit breakout tick
        engine.observe(40.0, 2021.0);
        let candidate = engine
            .generate(&regime(PriceRegime::TrendUp, FlowRegime::Active), &Policy::default())
            .unwrap();
        assert_eq!(candidate.side, CandidateSide::Long);
        assert_eq!(candidate.entry, 2021.0);
        assert_relative_eq!(candidate.stop, 2010.895, epsilon = 1e-6);
        assert_relative_eq!(candidate.tp.unwrap(), 2041.21, epsilon = 1e-6);
    }

    #[test]
    fn range_mean_revert_long_on_low_deviation() {
        let mut engine = SignalEngine::new();
        for i in 0..30 {
            engine.observe(i as f64, 2000.0);
        }
        engine.observe(30.0, 1900.0);
        let candidate = engine
            .generate(&regime(PriceRegime::Range, FlowRegime::Calm), &Policy::default())
            .unwrap();
        assert_eq!(candidate.side, CandidateSide::Long);
    }

    #[test]
    fn history_below_five_emits_nothing() {
        let mut engine = SignalEngine::new();
        for i in 0..3 {
            engine.observe(i as f64, 2000.0);
        }
        let c = engine.generate(&regime(PriceRegime::Range, FlowRegime::Calm), &Policy::default());
        assert!(c.is_none());
    }
}
