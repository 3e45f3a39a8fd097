//! Open-position lifecycle tracking (SPEC_FULL.md §4.13). This module has no
//! counterpart in the distilled spec; it is grounded in
//! `original_source/position/manager.py` and `original_source/position/monitor.py`,
//! which the distillation dropped but which a complete engine needs to turn
//! an `ExecutionPlan`'s fills into a position the rest of the pipeline can
//! reason about (tilt PnL, ledger, risk cascade's `position_notional`).

use crate::candidate::CandidateSide;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PositionId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    Ttl,
    Manual,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: Timestamp,
    pub price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: PositionId,
    pub side: CandidateSide,
    pub entry_price: f64,
    pub size: f64,
    pub stop: f64,
    pub tp: Option<f64>,
    pub opened_at: Timestamp,
    pub expires_at: Timestamp,
    pub fills: Vec<Fill>,
}

impl Position {
    pub fn notional(&self) -> f64 {
        self.entry_price * self.size
    }

    /// Unrealized PnL at `price`; positive for a long above entry or a short
    /// below entry.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            CandidateSide::Long => (price - self.entry_price) * self.size,
            CandidateSide::Short => (self.entry_price - price) * self.size,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PositionStatistics {
    pub open_count: usize,
    pub total_exposure_usd: f64,
    pub total_unrealized_pnl: f64,
}

/// Owns every open position and assigns monotonic ids (REDESIGN FLAGS: plain
/// integers instead of string ids referencing other records).
pub struct PositionTracker {
    positions: HashMap<PositionId, Position>,
    next_id: u64,
}

impl Default for PositionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionTracker {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn open_position(
        &mut self,
        side: CandidateSide,
        entry_price: f64,
        size: f64,
        stop: f64,
        tp: Option<f64>,
        opened_at: Timestamp,
        max_hold_time_sec: f64,
    ) -> PositionId {
        let id = PositionId(self.next_id);
        self.next_id += 1;
        self.positions.insert(
            id,
            Position {
                id,
                side,
                entry_price,
                size,
                stop,
                tp,
                opened_at,
                expires_at: opened_at + max_hold_time_sec,
                fills: Vec::new(),
            },
        );
        id
    }

    pub fn record_fill(&mut self, id: PositionId, fill: Fill) {
        if let Some(p) = self.positions.get_mut(&id) {
            p.fills.push(fill);
        }
    }

    pub fn close_position(&mut self, id: PositionId) -> Option<Position> {
        self.positions.remove(&id)
    }

    pub fn get(&self, id: PositionId) -> Option<&Position> {
        self.positions.get(&id)
    }

    pub fn active_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn total_exposure_usd(&self) -> f64 {
        self.positions.values().map(|p| p.notional()).sum()
    }

    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.positions.values().map(|p| p.unrealized_pnl(price)).sum()
    }

    pub fn statistics(&self, price: f64) -> PositionStatistics {
        PositionStatistics {
            open_count: self.positions.len(),
            total_exposure_usd: self.total_exposure_usd(),
            total_unrealized_pnl: self.unrealized_pnl(price),
        }
    }
}

/// Evaluates every open position against the current price each tick and
/// reports at most one exit per position per call, checking stop-loss before
/// take-profit before TTL (SPEC_FULL.md §4.13 edge cases).
pub struct PositionMonitor;

impl PositionMonitor {
    pub fn check_positions(
        tracker: &PositionTracker,
        current_price: f64,
        now: Timestamp,
    ) -> Vec<(PositionId, ExitReason, f64)> {
        let mut exits = Vec::new();
        for position in tracker.active_positions() {
            if let Some(reason) = Self::check_one(position, current_price, now) {
                exits.push((position.id, reason, current_price));
            }
        }
        exits
    }

    fn check_one(position: &Position, price: f64, now: Timestamp) -> Option<ExitReason> {
        let stop_hit = match position.side {
            CandidateSide::Long => price <= position.stop,
            CandidateSide::Short => price >= position.stop,
        };
        if stop_hit {
            return Some(ExitReason::StopLoss);
        }

        if let Some(tp) = position.tp {
            let tp_hit = match position.side {
                CandidateSide::Long => price >= tp,
                CandidateSide::Short => price <= tp,
            };
            if tp_hit {
                return Some(ExitReason::TakeProfit);
            }
        }

        if now >= position.expires_at {
            return Some(ExitReason::Ttl);
        }

        None
    }
}
