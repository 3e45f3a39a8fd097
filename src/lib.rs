//! Real-time market-microstructure risk engine.
//!
//! A single-threaded, per-tick pipeline: an [`orderbook::OrderBook`] and
//! [`trade_tape::TradeTape`] feed a [`features::FeatureEngine`], whose
//! output drives two anomaly detectors ([`oad`], [`vad`]) and a
//! [`stress::StressAggregator`], which together with a
//! [`regime::RegimeClassifier`] gate a [`signal_engine::SignalEngine`].
//! Every candidate it emits passes through [`risk_guardian::RiskGuardian`]'s
//! prioritized deny cascade before an [`execution::ExecutionPlanner`] turns
//! it into orders. [`orchestrator::Orchestrator`] owns one instance of each
//! component and drives them tick by tick, appending every artifact to an
//! append-only [`ledger::Ledger`].

pub mod account;
pub mod candidate;
pub mod collectors;
pub mod error;
pub mod event_bus;
pub mod execution;
pub mod features;
pub mod ledger;
pub mod level;
pub mod oad;
pub mod orchestrator;
pub mod orderbook;
pub mod policy;
pub mod position;
pub mod reason;
pub mod regime;
pub mod risk_guardian;
pub mod rolling_mad;
pub mod signal_engine;
pub mod stress;
pub mod tilt;
pub mod time;
pub mod trade_tape;
pub mod vad;

pub use account::AccountState;
pub use candidate::{CandidateSide, TradeCandidate};
pub use collectors::{ExecutionAdapter, Fill as CollectorFill, MarketDataCollector};
pub use error::{LedgerError, OrderBookError, PolicyError};
pub use execution::{ExecutionMode, ExecutionPlan, ExecutionPlanner, Order, OrderType};
pub use features::{FeatureEngine, FeatureVector, DEFAULT_TAPE_WINDOW_SEC};
pub use ledger::{Ledger, LedgerRecord, PositionExitRecord};
pub use level::AlertLevel;
pub use oad::{OadReport, OrderbookAnomalyDetector};
pub use orchestrator::{Orchestrator, SystemState, DEFAULT_CADENCE_SEC};
pub use orderbook::{BookChange, OrderBook, OrderBookLevel, OrderBookState, Side};
pub use policy::{EngineConfig, Policy, StrategyTag};
pub use position::{ExitReason, Fill as PositionFill, Position, PositionId, PositionMonitor, PositionTracker};
pub use reason::ReasonCode;
pub use regime::{FlowRegime, PriceRegime, RegimeClassifier, RegimeState, VolRegime};
pub use risk_guardian::{RiskAction, RiskDecision, RiskGuardian};
pub use rolling_mad::RollingMad;
pub use signal_engine::SignalEngine;
pub use stress::{StressAggregator, StressIndex};
pub use tilt::TiltTracker;
pub use time::{calendar_date, wall_clock_now, Timestamp};
pub use trade_tape::{Trade, TradeSide, TradeTape};
pub use vad::{VadReport, VolumeAnomalyDetector};
