//! Turns a [`crate::risk_guardian::RiskDecision`] into concrete orders
//! (SPEC_FULL.md §4.12).

use crate::candidate::{CandidateSide, TradeCandidate};
use crate::reason::ReasonCode;
use crate::risk_guardian::{RiskAction, RiskDecision};
use crate::time::Timestamp;
use crate::vad::VadReport;
use serde::{Deserialize, Serialize};

const SLICE_COUNT: usize = 5;
const SLICE_DELAYS_SEC: [f64; SLICE_COUNT] = [0.0, 10.0, 20.0, 30.0, 40.0];
const TAKER_TOXIC_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionMode {
    Maker,
    Taker,
    Slicing,
    ReduceOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    Market,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Order {
    pub side: CandidateSide,
    pub size_usd: f64,
    pub order_type: OrderType,
    pub limit_price: Option<f64>,
    pub delay_sec: f64,
    pub reduce_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub timestamp: Timestamp,
    pub orders: Vec<Order>,
    pub mode: ExecutionMode,
    pub reasons: Vec<ReasonCode>,
}

pub struct ExecutionPlanner;

impl ExecutionPlanner {
    /// Builds a plan from a risk decision. `candidate` must be the same one
    /// passed into the decision that produced a non-deny action; a `None`
    /// candidate always yields an empty reduce-only plan. `impact_side_bps`
    /// is the same side-matched impact the risk cascade used (SPEC_FULL.md
    /// §9's fixed inconsistency) and `slicing_threshold_bps` comes from
    /// `policy.execution.slicing_threshold_bps` — the slicing check is
    /// evaluated first, ahead of the toxic-taker check, per §4.12.
    pub fn plan(
        timestamp: Timestamp,
        decision: &RiskDecision,
        candidate: Option<&TradeCandidate>,
        vad: &VadReport,
        impact_side_bps: f64,
        slicing_threshold_bps: f64,
    ) -> ExecutionPlan {
        if decision.action == RiskAction::Deny || candidate.is_none() {
            return ExecutionPlan {
                timestamp,
                orders: Vec::new(),
                mode: ExecutionMode::ReduceOnly,
                reasons: decision.reasons.clone(),
            };
        }
        let candidate = candidate.unwrap();

        if impact_side_bps >= slicing_threshold_bps {
            let slice_size = decision.size_usd / SLICE_COUNT as f64;
            let orders = SLICE_DELAYS_SEC
                .iter()
                .map(|&delay_sec| Order {
                    side: candidate.side,
                    size_usd: slice_size,
                    order_type: OrderType::Limit,
                    limit_price: Some(candidate.entry),
                    delay_sec,
                    reduce_only: false,
                })
                .collect();
            return ExecutionPlan {
                timestamp,
                orders,
                mode: ExecutionMode::Slicing,
                reasons: decision.reasons.clone(),
            };
        }

        if vad.toxic >= TAKER_TOXIC_THRESHOLD {
            return ExecutionPlan {
                timestamp,
                orders: vec![Order {
                    side: candidate.side,
                    size_usd: decision.size_usd,
                    order_type: OrderType::Market,
                    limit_price: None,
                    delay_sec: 0.0,
                    reduce_only: false,
                }],
                mode: ExecutionMode::Taker,
                reasons: decision.reasons.clone(),
            };
        }

        ExecutionPlan {
            timestamp,
            orders: vec![Order {
                side: candidate.side,
                size_usd: decision.size_usd,
                order_type: OrderType::Limit,
                limit_price: Some(candidate.entry),
                delay_sec: 0.0,
                reduce_only: false,
            }],
            mode: ExecutionMode::Maker,
            reasons: decision.reasons.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::StrategyTag;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn candidate() -> TradeCandidate {
        TradeCandidate {
            side: CandidateSide::Long,
            entry: 2000.0,
            stop: 1980.0,
            tp: Some(2040.0),
            confidence: 0.7,
            ttl_sec: 300.0,
            strategy: StrategyTag::TrendBreakout,
            generated_at: 0.0,
        }
    }

    fn vad(toxic: f64) -> VadReport {
        VadReport {
            timestamp: 0.0,
            level: crate::level::AlertLevel::Ok,
            score: 0.0,
            triggers: HashMap::new(),
            events: Default::default(),
            toxic,
        }
    }

    fn allow_decision(size_usd: f64, max_slippage_bps: f64) -> RiskDecision {
        RiskDecision {
            action: RiskAction::Allow,
            size_usd,
            max_slippage_bps,
            reasons: Vec::new(),
            facts: HashMap::new(),
        }
    }

    #[test]
    fn deny_produces_empty_reduce_only_plan() {
        let decision = RiskDecision {
            action: RiskAction::Deny,
            size_usd: 0.0,
            max_slippage_bps: 0.0,
            reasons: vec![ReasonCode::NoSignal],
            facts: HashMap::new(),
        };
        let plan = ExecutionPlanner::plan(0.0, &decision, None, &vad(0.1), 5.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::ReduceOnly);
        assert!(plan.orders.is_empty());
    }

    #[test]
    fn no_candidate_produces_reduce_only_even_on_allow() {
        let plan = ExecutionPlanner::plan(0.0, &allow_decision(1000.0, 5.0), None, &vad(0.1), 5.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::ReduceOnly);
    }

    #[test]
    fn toxic_flow_forces_taker_market_order() {
        let c = candidate();
        let plan = ExecutionPlanner::plan(0.0, &allow_decision(1000.0, 9.0), Some(&c), &vad(0.7), 6.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::Taker);
        assert_eq!(plan.orders.len(), 1);
        assert_eq!(plan.orders[0].order_type, OrderType::Market);
    }

    #[test]
    fn high_impact_triggers_slicing_into_five_orders_with_staggered_delays() {
        let c = candidate();
        let plan = ExecutionPlanner::plan(0.0, &allow_decision(1000.0, 15.0), Some(&c), &vad(0.1), 12.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::Slicing);
        assert_eq!(plan.orders.len(), 5);
        let delays: Vec<f64> = plan.orders.iter().map(|o| o.delay_sec).collect();
        assert_eq!(delays, vec![0.0, 10.0, 20.0, 30.0, 40.0]);
        let total: f64 = plan.orders.iter().map(|o| o.size_usd).sum();
        assert_relative_eq!(total, 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn slicing_takes_priority_over_toxic_taker_when_both_qualify() {
        let c = candidate();
        let plan = ExecutionPlanner::plan(0.0, &allow_decision(700.0, 15.0), Some(&c), &vad(0.9), 12.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::Slicing);
    }

    #[test]
    fn low_impact_produces_single_maker_limit_order() {
        let c = candidate();
        let plan = ExecutionPlanner::plan(0.0, &allow_decision(1000.0, 7.5), Some(&c), &vad(0.1), 5.0, 10.0);
        assert_eq!(plan.mode, ExecutionMode::Maker);
        assert_eq!(plan.orders.len(), 1);
        assert_eq!(plan.orders[0].order_type, OrderType::Limit);
        assert_eq!(plan.orders[0].limit_price, Some(2000.0));
    }
}
