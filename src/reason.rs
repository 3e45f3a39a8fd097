//! Closed set of reason codes the risk gate and execution planner attach to
//! decisions (SPEC_FULL.md §6). Kept as an enumeration rather than free-form
//! strings so a downstream ledger consumer never meets an unrecognized code.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReasonCode {
    DataInconsistent,
    DataStale,
    ConnectionLost,
    DailyLossExceeded,
    CooldownActive,
    PositionLimitExceeded,
    LeverageLimitExceeded,
    ImpactHardCapExceeded,
    ImpactEntryCapExceeded,
    ToxicDangerLevel,
    ToxicWarnLevel,
    MarketStressDanger,
    TradeFrequencyExceeded,
    RiskPositionSizeReduced,
    RiskLeverageReduced,
    NoSignal,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::DataInconsistent => "DATA_INCONSISTENT",
            ReasonCode::DataStale => "DATA_STALE",
            ReasonCode::ConnectionLost => "CONNECTION_LOST",
            ReasonCode::DailyLossExceeded => "DAILY_LOSS_EXCEEDED",
            ReasonCode::CooldownActive => "COOLDOWN_ACTIVE",
            ReasonCode::PositionLimitExceeded => "POSITION_LIMIT_EXCEEDED",
            ReasonCode::LeverageLimitExceeded => "LEVERAGE_LIMIT_EXCEEDED",
            ReasonCode::ImpactHardCapExceeded => "IMPACT_HARD_CAP_EXCEEDED",
            ReasonCode::ImpactEntryCapExceeded => "IMPACT_ENTRY_CAP_EXCEEDED",
            ReasonCode::ToxicDangerLevel => "TOXIC_DANGER_LEVEL",
            ReasonCode::ToxicWarnLevel => "TOXIC_WARN_LEVEL",
            ReasonCode::MarketStressDanger => "MARKET_STRESS_DANGER",
            ReasonCode::TradeFrequencyExceeded => "TRADE_FREQUENCY_EXCEEDED",
            ReasonCode::RiskPositionSizeReduced => "RISK_POSITION_SIZE_REDUCED",
            ReasonCode::RiskLeverageReduced => "RISK_LEVERAGE_REDUCED",
            ReasonCode::NoSignal => "NO_SIGNAL",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
