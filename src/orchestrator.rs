//! Owns every component instance and drives the per-tick pipeline.
//! Single-threaded and cooperative: one call to [`Orchestrator::tick`] runs
//! the whole book-to-ledger pipeline to completion before returning.
//! [`Orchestrator::run`] wraps `tick` in the fixed-cadence driver described
//! by SPEC_FULL.md §4.14.

use crate::collectors::{ExecutionAdapter, MarketDataCollector};
use crate::execution::ExecutionPlanner;
use crate::features::FeatureEngine;
use crate::ledger::{Ledger, LedgerRecord};
use crate::oad::OrderbookAnomalyDetector;
use crate::orderbook::OrderBook;
use crate::policy::{EngineConfig, Policy};
use crate::position::{Fill as PositionFill, PositionMonitor, PositionTracker};
use crate::regime::RegimeClassifier;
use crate::risk_guardian::{RiskAction, RiskGuardian};
use crate::signal_engine::SignalEngine;
use crate::stress::StressAggregator;
use crate::time::Timestamp;
use crate::trade_tape::TradeTape;
use crate::vad::VolumeAnomalyDetector;
use anyhow::ensure;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Default fixed cadence a [`Orchestrator::run`] loop drives at, per
/// SPEC_FULL.md §4.14.
pub const DEFAULT_CADENCE_SEC: f64 = 1.0;

/// Catches a panic from an external collaborator (a [`MarketDataCollector`]
/// or [`ExecutionAdapter`] implementation) and turns it into an error
/// instead of unwinding into the pipeline, mirroring the event bus's
/// subscriber isolation.
fn safe_call<T>(label: &'static str, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(collaborator = label, "external collaborator panicked");
            Err(anyhow::anyhow!("{label} panicked"))
        }
    }
}

/// A snapshot of what the orchestrator is doing right now, for external
/// monitoring (not persisted).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemState {
    pub running: bool,
    pub paused: bool,
    pub tick_id: u64,
}

pub struct Orchestrator {
    policy: Policy,
    engine_config: EngineConfig,
    book: OrderBook,
    tape: TradeTape,
    features: FeatureEngine,
    oad: OrderbookAnomalyDetector,
    vad: VolumeAnomalyDetector,
    regime: RegimeClassifier,
    signals: SignalEngine,
    risk: RiskGuardian,
    positions: PositionTracker,
    ledger: Ledger,
    bus: crate::event_bus::EventBus,
    tick_id: u64,
    running: bool,
    paused: bool,
    has_snapshot: bool,
    last_tick_ts: Option<Timestamp>,
}

impl Orchestrator {
    pub fn new(
        policy: Policy,
        engine_config: EngineConfig,
        ledger_dir: impl Into<PathBuf>,
    ) -> Result<Self, crate::error::PolicyError> {
        policy.validate()?;
        Ok(Self {
            features: FeatureEngine::new(
                policy.features.impact_size_quote_usd,
                engine_config.tape_feature_window_sec,
            ),
            oad: OrderbookAnomalyDetector::new(
                engine_config.oad_short_window_sec,
                engine_config.oad_long_window_sec,
                policy.oad.clone(),
            ),
            vad: VolumeAnomalyDetector::new(engine_config.vad_window_sec, policy.vad.clone()),
            tape: TradeTape::new(engine_config.tape_span_sec),
            book: OrderBook::new(),
            regime: RegimeClassifier::new(),
            signals: SignalEngine::new(),
            risk: RiskGuardian::new(),
            positions: PositionTracker::new(),
            ledger: Ledger::new(ledger_dir),
            bus: crate::event_bus::EventBus::new(),
            policy,
            engine_config,
            tick_id: 0,
            running: false,
            paused: false,
            has_snapshot: false,
            last_tick_ts: None,
        })
    }

    pub fn event_bus(&self) -> &crate::event_bus::EventBus {
        &self.bus
    }

    pub fn start(&mut self) {
        self.running = true;
        self.paused = false;
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.ledger.close();
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn state(&self) -> SystemState {
        SystemState {
            running: self.running,
            paused: self.paused,
            tick_id: self.tick_id,
        }
    }

    /// Drives the fixed-cadence loop (SPEC_FULL.md §4.14): checks `running`
    /// at the top of every iteration, runs one tick, and sleeps the
    /// remainder of `cadence_sec` minus however long the tick took. Any
    /// error out of [`Orchestrator::tick`] (the only case left is the
    /// non-monotonic-timestamp guard; every data-quality failure is handled
    /// inside the pipeline as a `DENY`) is caught, logged, and the loop
    /// continues rather than unwinding out of `run` — no exception escapes a
    /// tick at steady state.
    ///
    /// `next_tick` is polled once per iteration for the next tick's
    /// timestamp; returning `None` is a shutdown request. Since a tick runs
    /// to completion synchronously before `next_tick` is polled again, a
    /// shutdown request is only ever observed between ticks, never mid-tick.
    /// On shutdown the loop clears `running` and closes the ledger.
    pub fn run(
        &mut self,
        cadence_sec: f64,
        collector: &mut dyn MarketDataCollector,
        adapter: &mut dyn ExecutionAdapter,
        mut next_tick: impl FnMut() -> Option<Timestamp>,
    ) {
        self.running = true;
        let cadence = Duration::from_secs_f64(cadence_sec.max(0.0));
        while self.running {
            let period_start = Instant::now();
            let Some(now) = next_tick() else {
                break;
            };
            if let Err(err) = self.tick(now, collector, adapter) {
                tracing::error!(%err, tick_id = self.tick_id, "tick failed, continuing");
            }
            let elapsed = period_start.elapsed();
            if let Some(remainder) = cadence.checked_sub(elapsed) {
                std::thread::sleep(remainder);
            }
        }
        self.running = false;
        self.ledger.close();
    }

    /// Runs one full pipeline pass: ingest market data, recompute every
    /// derived artifact, evaluate risk, plan execution, monitor open
    /// positions, and append exactly one ledger record. `now` must be
    /// strictly greater than the previous call's `now`.
    pub fn tick(
        &mut self,
        now: Timestamp,
        collector: &mut dyn MarketDataCollector,
        adapter: &mut dyn ExecutionAdapter,
    ) -> anyhow::Result<()> {
        if !self.running || self.paused {
            return Ok(());
        }
        if let Some(last) = self.last_tick_ts {
            ensure!(
                now > last,
                "tick timestamps must be strictly increasing: {} <= {}",
                now,
                last
            );
        }
        self.last_tick_ts = Some(now);
        self.tick_id += 1;

        self.ingest_market_data(now, collector)?;

        let features = self.features.compute(&self.book, &mut self.tape, now);
        self.bus.publish_features(&features);

        let oad_report = self.oad.update(&features);
        self.bus.publish_oad(&oad_report);

        let vad_report = self.vad.update(&features);
        self.bus.publish_vad(&vad_report);

        let stress = StressAggregator::aggregate(&oad_report, &vad_report);
        self.bus.publish_stress(&stress);

        self.regime.observe(now, features.mid);
        let regime_state = self.regime.classify(&oad_report, &vad_report, &features);
        self.bus.publish_regime(&regime_state);

        self.signals.observe(now, features.mid);
        let candidate = self.signals.generate(&regime_state, &self.policy);
        self.bus.publish_candidate(&candidate);

        let account =
            safe_call("get_account_state", || adapter.get_account_state(features.mid))?;

        let decision = self.risk.evaluate(
            now,
            self.book.last_update(),
            candidate.as_ref(),
            &features,
            &vad_report,
            &stress,
            &account,
            &self.policy,
        );
        self.bus.publish_decision(&decision);

        let impact_side_bps = candidate
            .as_ref()
            .map(|c| features.impact_for_side(c.side))
            .unwrap_or(0.0);
        let plan = ExecutionPlanner::plan(
            now,
            &decision,
            candidate.as_ref(),
            &vad_report,
            impact_side_bps,
            self.policy.execution.slicing_threshold_bps,
        );
        self.bus.publish_plan(&plan);

        let mut fills = Vec::new();
        if !plan.orders.is_empty() {
            fills = safe_call("execute", || adapter.execute(&plan))?;
            if let (true, Some(cand)) = (
                matches!(decision.action, RiskAction::Allow | RiskAction::AllowWithReductions),
                candidate.as_ref(),
            ) {
                let position_id = self.positions.open_position(
                    cand.side,
                    cand.entry,
                    decision.size_usd,
                    cand.stop,
                    cand.tp,
                    now,
                    self.policy.position.max_hold_time_sec,
                );
                for fill in &fills {
                    self.positions.record_fill(
                        position_id,
                        PositionFill {
                            timestamp: now,
                            price: fill.price,
                            size: fill.size,
                        },
                    );
                }
            }
        }

        let mut position_exits = Vec::new();
        for (position_id, reason, exit_price) in
            PositionMonitor::check_positions(&self.positions, features.mid, now)
        {
            if let Some(position) = self.positions.close_position(position_id) {
                let pnl = position.unrealized_pnl(exit_price);
                self.risk.tilt_tracker_mut().record_trade(now, pnl);
                tracing::info!(?position_id, ?reason, pnl, "position closed");
                position_exits.push(crate::ledger::PositionExitRecord {
                    position_id,
                    reason,
                    exit_price,
                    realized_pnl: pnl,
                });
            }
        }

        let explain = LedgerRecord::build_explain(&decision, &plan, &regime_state);
        let record = LedgerRecord {
            tick_id: self.tick_id,
            timestamp: now,
            policy: self.policy.clone(),
            features,
            oad: oad_report,
            vad: vad_report,
            stress,
            regime: regime_state,
            candidate,
            decision,
            fills,
            position_exits,
            plan,
            explain,
        };
        self.ledger.append(&record);
        self.bus.publish_tick(&self.tick_id);

        Ok(())
    }

    fn ingest_market_data(
        &mut self,
        now: Timestamp,
        collector: &mut dyn MarketDataCollector,
    ) -> anyhow::Result<()> {
        let trades = safe_call("get_recent_trades", || collector.get_recent_trades())?;
        self.tape.add_batch(&trades);

        if !self.has_snapshot {
            let (bids, asks, seq) =
                safe_call("get_orderbook_snapshot", || collector.get_orderbook_snapshot())?;
            match self.book.apply_snapshot(&bids, &asks, seq, now) {
                Ok(()) => self.has_snapshot = true,
                Err(err) => {
                    // A data error (SPEC_FULL.md §7): log and retain the
                    // prior (here, still-empty) book rather than aborting
                    // the tick. The risk gate DENYs off the resulting stale
                    // or inconsistent features instead.
                    tracing::warn!(%err, "orderbook snapshot rejected, retaining prior book");
                }
            }
            return Ok(());
        }

        let deltas = safe_call("get_orderbook_deltas", || collector.get_orderbook_deltas())?;
        let next_seq = self.book.sequence() + 1;
        if self.book.apply_delta(&deltas, next_seq, now).is_err() {
            tracing::warn!("orderbook delta rejected, refetching snapshot");
            let (bids, asks, seq) =
                safe_call("get_orderbook_snapshot", || collector.get_orderbook_snapshot())?;
            if let Err(err) = self.book.apply_snapshot(&bids, &asks, seq, now) {
                tracing::warn!(%err, "orderbook snapshot rejected, retaining prior book");
            }
        }
        Ok(())
    }
}
