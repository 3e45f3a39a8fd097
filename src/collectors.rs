//! External interface traits (SPEC_FULL.md §6). The core depends only on
//! these; no concrete market-data or execution adapter ships in this crate.

use crate::account::AccountState;
use crate::execution::ExecutionPlan;
use crate::orderbook::{BookChange, OrderBookLevel};
use crate::position::PositionId;
use crate::trade_tape::Trade;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Supplies order book snapshots/deltas and recent trades. An implementor
/// typically wraps a websocket feed; reconnect/backoff logic lives there,
/// not in the core (SPEC_FULL.md §7.2).
pub trait MarketDataCollector: Send {
    fn get_orderbook_snapshot(&mut self) -> Result<(Vec<OrderBookLevel>, Vec<OrderBookLevel>, u64)>;
    fn get_orderbook_deltas(&mut self) -> Result<Vec<BookChange>>;
    fn get_recent_trades(&mut self) -> Result<Vec<Trade>>;
}

/// A single execution report returned after submitting (part of) an
/// [`ExecutionPlan`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Fill {
    pub position_id: Option<PositionId>,
    pub price: f64,
    pub size: f64,
}

/// Executes plans and reports account state. An implementor typically wraps
/// an exchange's order-entry API.
pub trait ExecutionAdapter: Send {
    fn execute(&mut self, plan: &ExecutionPlan) -> Result<Vec<Fill>>;
    /// `current_price` is the tick's mid, handed in so an adapter can value
    /// `position_notional`/`unrealized_pnl` without maintaining its own
    /// price feed (SPEC_FULL.md §6).
    fn get_account_state(&mut self, current_price: f64) -> Result<AccountState>;
    fn close_all_positions(&mut self) -> Result<Vec<Fill>>;
}
