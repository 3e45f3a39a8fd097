//! Per-day PnL accumulation and hourly trade-count rolling window.

use crate::time::{calendar_date, Timestamp};
use chrono::NaiveDate;
use std::collections::VecDeque;

const HOUR_SEC: f64 = 3600.0;

pub struct TiltTracker {
    trades: VecDeque<(Timestamp, f64)>,
    daily_pnl: f64,
    last_day: Option<NaiveDate>,
}

impl Default for TiltTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl TiltTracker {
    pub fn new() -> Self {
        Self {
            trades: VecDeque::new(),
            daily_pnl: 0.0,
            last_day: None,
        }
    }

    /// Records a trade's realized PnL, resetting the daily accumulator if
    /// the calendar day (UTC) has rolled over since the last record.
    pub fn record_trade(&mut self, timestamp: Timestamp, pnl: f64) {
        let day = calendar_date(timestamp);
        if self.last_day != Some(day) {
            self.daily_pnl = 0.0;
            self.last_day = Some(day);
        }
        self.daily_pnl += pnl;
        self.trades.push_back((timestamp, pnl));
    }

    pub fn trades_last_hour(&self, now: Timestamp) -> u32 {
        let cutoff = now - HOUR_SEC;
        self.trades.iter().filter(|&&(ts, _)| ts >= cutoff).count() as u32
    }

    pub fn daily_pnl_pct(&self, balance: f64) -> f64 {
        if balance <= 0.0 {
            0.0
        } else {
            100.0 * self.daily_pnl / balance
        }
    }

    pub fn daily_pnl(&self) -> f64 {
        self.daily_pnl
    }
}
