//! Account state reported by the external execution adapter
//! (SPEC_FULL.md §6).

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccountState {
    pub balance: f64,
    pub position_size: f64,
    pub position_notional: f64,
    pub unrealized_pnl: f64,
}
