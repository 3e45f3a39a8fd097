//! Typed errors at module boundaries.
//!
//! Components that can fail in a way a caller must branch on (book updates,
//! policy construction, ledger I/O) return a `thiserror` enum. The
//! orchestration boundary instead deals in `anyhow::Result` since callers
//! there only need to log and continue (see `orchestrator.rs`).

use thiserror::Error;

/// Errors from applying snapshots/deltas to an [`crate::orderbook::OrderBook`].
#[derive(Debug, Error, PartialEq)]
pub enum OrderBookError {
    #[error("orderbook inconsistent: best_ask {best_ask} <= best_bid {best_bid}")]
    OrderbookInconsistent { best_bid: f64, best_ask: f64 },

    #[error("sequence error: expected {expected}, got {got}")]
    SequenceError { expected: u64, got: u64 },
}

/// Errors from constructing or validating a [`crate::policy::Policy`].
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("field {field} out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },

    #[error("unknown strategy tag: {tag}")]
    UnknownStrategy { tag: String },
}

/// Errors from [`crate::ledger::Ledger::append`]. Logged by the ledger and
/// never propagated to the decision path (see SPEC_FULL.md §7.1).
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
