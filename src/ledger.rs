//! Append-only journal of every tick's full artifact set, partitioned into
//! one file per calendar date. I/O failures are logged and swallowed here
//! rather than propagated, since a ledger outage must never stop the risk
//! pipeline from running — the one exception to "errors propagate via `?`"
//! in this crate.

use crate::candidate::TradeCandidate;
use crate::collectors::Fill;
use crate::error::LedgerError;
use crate::execution::ExecutionPlan;
use crate::features::FeatureVector;
use crate::oad::OadReport;
use crate::policy::Policy;
use crate::position::{ExitReason, PositionId};
use crate::regime::RegimeState;
use crate::risk_guardian::RiskDecision;
use crate::stress::StressIndex;
use crate::time::{calendar_date, Timestamp};
use crate::vad::VadReport;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// One position exit recorded in a tick's ledger entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionExitRecord {
    pub position_id: PositionId,
    pub reason: ExitReason,
    pub exit_price: f64,
    pub realized_pnl: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerRecord {
    pub tick_id: u64,
    pub timestamp: Timestamp,
    pub policy: Policy,
    pub features: FeatureVector,
    pub oad: OadReport,
    pub vad: VadReport,
    pub stress: StressIndex,
    pub regime: RegimeState,
    pub candidate: Option<TradeCandidate>,
    pub decision: RiskDecision,
    pub plan: ExecutionPlan,
    pub fills: Vec<Fill>,
    pub position_exits: Vec<PositionExitRecord>,
    pub explain: String,
}

impl LedgerRecord {
    /// One-line human-readable summary of the tick's decision, independent
    /// of the structured fields — meant for a log tail, not re-parsing.
    pub fn build_explain(
        decision: &RiskDecision,
        plan: &ExecutionPlan,
        regime: &RegimeState,
    ) -> String {
        let reasons = decision
            .reasons
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "action={:?} mode={:?} size_usd={:.2} price_regime={:?} flow_regime={:?} reasons=[{}]",
            decision.action, plan.mode, decision.size_usd, regime.price_regime, regime.flow_regime, reasons
        )
    }
}

/// Opens (and rolls over) one line-delimited JSON file per UTC calendar day
/// under `base_dir`.
pub struct Ledger {
    base_dir: PathBuf,
    current_date: Option<chrono::NaiveDate>,
    writer: Option<BufWriter<File>>,
}

impl Ledger {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            current_date: None,
            writer: None,
        }
    }

    /// Appends one record, rolling over to a new file if the calendar date
    /// has changed. Never returns an error; failures are logged.
    pub fn append(&mut self, record: &LedgerRecord) {
        if let Err(e) = self.try_append(record) {
            tracing::error!(error = %e, tick_id = record.tick_id, "ledger append failed");
        }
    }

    fn try_append(&mut self, record: &LedgerRecord) -> Result<(), LedgerError> {
        let date = calendar_date(record.timestamp);
        if self.current_date != Some(date) {
            self.roll_over(date)?;
        }
        let line = serde_json::to_string(record)?;
        let writer = self.writer.as_mut().expect("roll_over sets writer");
        writeln!(writer, "{line}")?;
        writer.flush()?;
        Ok(())
    }

    fn roll_over(&mut self, date: chrono::NaiveDate) -> Result<(), LedgerError> {
        fs::create_dir_all(&self.base_dir)?;
        let path = self.base_dir.join(format!("{date}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_date = Some(date);
        Ok(())
    }

    pub fn close(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                tracing::error!(error = %e, "ledger flush on close failed");
            }
        }
        self.writer = None;
        self.current_date = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::ExecutionMode;
    use crate::level::AlertLevel;
    use crate::oad::LiquidityState;
    use crate::position::{ExitReason, PositionId};
    use crate::regime::{FlowRegime, PriceRegime, VolRegime};
    use crate::risk_guardian::RiskAction;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_record(tick_id: u64, timestamp: Timestamp) -> LedgerRecord {
        let features = FeatureVector {
            timestamp,
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
            signed_imb: 0.1,
            toxic: 0.1,
        };
        let oad = OadReport {
            timestamp,
            level: AlertLevel::Ok,
            score: 0.0,
            triggers: HashMap::new(),
            liquidity_state: LiquidityState::Thick,
            gap_flag: false,
        };
        let vad = VadReport {
            timestamp,
            level: AlertLevel::Ok,
            score: 0.0,
            triggers: HashMap::new(),
            events: Default::default(),
            toxic: 0.1,
        };
        let stress = StressIndex {
            timestamp,
            level: AlertLevel::Ok,
            score: 0.0,
            components: HashMap::new(),
        };
        let regime = RegimeState {
            timestamp,
            price_regime: PriceRegime::Range,
            vol_regime: VolRegime::NormalVol,
            flow_regime: FlowRegime::Calm,
            confidence: 0.4,
        };
        let decision = RiskDecision {
            action: RiskAction::Deny,
            size_usd: 0.0,
            max_slippage_bps: 0.0,
            reasons: vec![crate::reason::ReasonCode::NoSignal],
            facts: HashMap::new(),
        };
        let plan = ExecutionPlan {
            timestamp,
            orders: Vec::new(),
            mode: ExecutionMode::ReduceOnly,
            reasons: decision.reasons.clone(),
        };
        let explain = LedgerRecord::build_explain(&decision, &plan, &regime);
        LedgerRecord {
            tick_id,
            timestamp,
            policy: crate::policy::Policy::default(),
            features,
            oad,
            vad,
            stress,
            regime,
            candidate: None,
            decision,
            plan,
            fills: Vec::new(),
            position_exits: Vec::new(),
            explain,
        }
    }

    #[test]
    fn append_creates_one_file_per_calendar_date() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::new(dir.path());
        ledger.append(&sample_record(1, 1_700_000_000.0));
        ledger.append(&sample_record(2, 1_700_000_000.0 + 86_400.0));
        ledger.close();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn appended_records_round_trip_through_json() {
        let dir = tempdir().unwrap();
        let mut ledger = Ledger::new(dir.path());
        let record = sample_record(1, 1_700_000_000.0);
        ledger.append(&record);
        ledger.close();

        let path = dir.path().join(format!("{}.jsonl", calendar_date(record.timestamp)));
        let content = fs::read_to_string(path).unwrap();
        let line = content.lines().next().unwrap();
        let parsed: LedgerRecord = serde_json::from_str(line).unwrap();
        assert_eq!(parsed.tick_id, record.tick_id);
        assert_eq!(parsed.timestamp, record.timestamp);
    }

    #[test]
    fn explain_string_mentions_action_and_mode() {
        let record = sample_record(1, 0.0);
        assert!(record.explain.contains("Deny"));
        assert!(record.explain.contains("ReduceOnly"));
    }

    #[test]
    fn fills_and_position_exits_round_trip() {
        let mut record = sample_record(1, 0.0);
        record.fills.push(Fill {
            position_id: Some(PositionId(1)),
            price: 2001.5,
            size: 0.5,
        });
        record.position_exits.push(PositionExitRecord {
            position_id: PositionId(1),
            reason: ExitReason::TakeProfit,
            exit_price: 2040.0,
            realized_pnl: 19.25,
        });
        let line = serde_json::to_string(&record).unwrap();
        let parsed: LedgerRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.fills.len(), 1);
        assert_eq!(parsed.position_exits.len(), 1);
        assert_eq!(parsed.position_exits[0].reason, ExitReason::TakeProfit);
    }
}
