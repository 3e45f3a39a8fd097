//! Trade candidates emitted by the [`crate::signal_engine::SignalEngine`]
//! (SPEC_FULL.md §3).

use crate::policy::StrategyTag;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateSide {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeCandidate {
    pub side: CandidateSide,
    pub entry: f64,
    pub stop: f64,
    pub tp: Option<f64>,
    pub confidence: f64,
    pub ttl_sec: f64,
    pub strategy: StrategyTag,
    pub generated_at: Timestamp,
}

impl TradeCandidate {
    /// Invariant: stop sits on the loss side of entry for the candidate's
    /// side (long stops below entry, short stops above).
    pub fn stop_is_on_loss_side(&self) -> bool {
        match self.side {
            CandidateSide::Long => self.stop < self.entry,
            CandidateSide::Short => self.stop > self.entry,
        }
    }
}
