//! The prioritized risk-check cascade (SPEC_FULL.md §4.11). Each rule is
//! evaluated in order; the first DENY aborts the cascade, while size
//! reductions accumulate once every hard check has passed.

use crate::account::AccountState;
use crate::candidate::TradeCandidate;
use crate::features::FeatureVector;
use crate::level::AlertLevel;
use crate::policy::Policy;
use crate::reason::ReasonCode;
use crate::stress::StressIndex;
use crate::tilt::TiltTracker;
use crate::time::Timestamp;
use crate::vad::VadReport;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

const DATA_STALE_SEC: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskAction {
    Allow,
    AllowWithReductions,
    Deny,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskDecision {
    pub action: RiskAction,
    pub size_usd: f64,
    pub max_slippage_bps: f64,
    pub reasons: Vec<ReasonCode>,
    pub facts: HashMap<String, f64>,
}

impl RiskDecision {
    fn deny(reason: ReasonCode, facts: HashMap<String, f64>) -> Self {
        Self {
            action: RiskAction::Deny,
            size_usd: 0.0,
            max_slippage_bps: 0.0,
            reasons: vec![reason],
            facts,
        }
    }
}

/// Owns the tilt tracker and cooldown state; the cascade itself is a pure
/// function of these plus the per-tick inputs passed to `evaluate`.
pub struct RiskGuardian {
    tilt: TiltTracker,
    cooldown_until: Option<Timestamp>,
}

impl Default for RiskGuardian {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskGuardian {
    pub fn new() -> Self {
        Self {
            tilt: TiltTracker::new(),
            cooldown_until: None,
        }
    }

    pub fn tilt_tracker_mut(&mut self) -> &mut TiltTracker {
        &mut self.tilt
    }

    pub fn tilt_tracker(&self) -> &TiltTracker {
        &self.tilt
    }

    pub fn set_cooldown_until(&mut self, until: Option<Timestamp>) {
        self.cooldown_until = until;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        now: Timestamp,
        last_book_update_ts: Timestamp,
        candidate: Option<&TradeCandidate>,
        features: &FeatureVector,
        vad: &VadReport,
        stress: &StressIndex,
        account: &AccountState,
        policy: &Policy,
    ) -> RiskDecision {
        let mut facts = HashMap::new();

        let Some(candidate) = candidate else {
            return RiskDecision::deny(ReasonCode::NoSignal, facts);
        };

        let stale_sec = now - last_book_update_ts;
        facts.insert("stale_sec".to_string(), stale_sec);
        if stale_sec > DATA_STALE_SEC {
            return RiskDecision::deny(ReasonCode::DataStale, facts);
        }
        if features.spread <= 0.0 {
            return RiskDecision::deny(ReasonCode::DataInconsistent, facts);
        }

        let daily_pnl_pct = self.tilt.daily_pnl_pct(account.balance);
        facts.insert("daily_pnl_pct".to_string(), daily_pnl_pct);
        if daily_pnl_pct < -policy.max_daily_loss_pct {
            return RiskDecision::deny(ReasonCode::DailyLossExceeded, facts);
        }

        if let Some(until) = self.cooldown_until {
            if now < until {
                return RiskDecision::deny(ReasonCode::CooldownActive, facts);
            }
        }

        facts.insert("position_notional".to_string(), account.position_notional);
        if account.position_notional >= policy.max_position_notional {
            return RiskDecision::deny(ReasonCode::PositionLimitExceeded, facts);
        }

        // impact_side is computed once and threaded through every remaining
        // rule (both the hard-cap check and the reduction branch) so the two
        // never diverge, closing the gap noted in SPEC_FULL.md §9.
        let impact_side = features.impact_for_side(candidate.side);
        facts.insert("impact_side_bps".to_string(), impact_side);
        facts.insert("toxic".to_string(), vad.toxic);

        if impact_side > policy.impact_hard_cap_bps {
            return RiskDecision::deny(ReasonCode::ImpactHardCapExceeded, facts);
        }
        if vad.toxic >= policy.vad.toxic_danger {
            return RiskDecision::deny(ReasonCode::ToxicDangerLevel, facts);
        }

        if stress.level == AlertLevel::Danger {
            return RiskDecision::deny(ReasonCode::MarketStressDanger, facts);
        }

        let trades_last_hour = self.tilt.trades_last_hour(now);
        facts.insert("trades_last_hour".to_string(), trades_last_hour as f64);
        if trades_last_hour >= policy.max_trades_per_hour {
            return RiskDecision::deny(ReasonCode::TradeFrequencyExceeded, facts);
        }

        let base_size = 1000.0f64.min(policy.max_position_notional - account.position_notional);
        let mut multiplier = 1.0;
        let mut reasons = Vec::new();

        if impact_side > policy.impact_entry_cap_bps {
            multiplier *= 0.5;
            reasons.push(ReasonCode::ImpactEntryCapExceeded);
        }
        if vad.toxic >= policy.vad.toxic_warn {
            multiplier *= 0.7;
            reasons.push(ReasonCode::ToxicWarnLevel);
        }
        if stress.level == AlertLevel::Warn {
            multiplier *= 0.5;
        }

        let final_size = (base_size * multiplier).max(0.0);
        let max_slippage_bps = (1.5 * impact_side).min(15.0);
        facts.insert("multiplier".to_string(), multiplier);
        facts.insert("base_size".to_string(), base_size);

        let action = if multiplier >= 1.0 {
            RiskAction::Allow
        } else {
            reasons.push(ReasonCode::RiskPositionSizeReduced);
            RiskAction::AllowWithReductions
        };

        RiskDecision {
            action,
            size_usd: final_size,
            max_slippage_bps,
            reasons,
            facts,
        }
    }
}
