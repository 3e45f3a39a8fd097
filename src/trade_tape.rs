//! Sliding window of executed trades with aggregate statistics
//! (SPEC_FULL.md §4.2).

use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

const EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Buy,
    Sell,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub timestamp: Timestamp,
    pub price: f64,
    pub size: f64,
    pub side: TradeSide,
}

/// Aggregate statistics over a window of trades. The zero value is the
/// aggregate of an empty window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TapeAggregate {
    pub volume: f64,
    pub trade_count: u64,
    pub buy_vol: f64,
    pub sell_vol: f64,
    pub avg_trade: f64,
    pub min_trade: f64,
    pub max_trade: f64,
    pub vwap: f64,
    pub signed_imb: f64,
}

impl Default for TapeAggregate {
    fn default() -> Self {
        Self {
            volume: 0.0,
            trade_count: 0,
            buy_vol: 0.0,
            sell_vol: 0.0,
            avg_trade: 0.0,
            min_trade: 0.0,
            max_trade: 0.0,
            vwap: 0.0,
            signed_imb: 0.0,
        }
    }
}

/// Time-bounded sliding window of trades. Eviction of entries older than
/// `span_sec` happens lazily, on the first read that touches the cutoff.
#[derive(Debug, Clone)]
pub struct TradeTape {
    span_sec: f64,
    trades: VecDeque<Trade>,
}

impl TradeTape {
    pub fn new(span_sec: f64) -> Self {
        Self {
            span_sec,
            trades: VecDeque::new(),
        }
    }

    pub fn add(&mut self, trade: Trade) {
        self.trades.push_back(trade);
    }

    pub fn add_batch(&mut self, trades: &[Trade]) {
        for t in trades {
            self.add(*t);
        }
    }

    fn evict(&mut self, now: Timestamp) {
        let cutoff = now - self.span_sec;
        while let Some(front) = self.trades.front() {
            if front.timestamp < cutoff {
                self.trades.pop_front();
            } else {
                break;
            }
        }
    }

    /// Trades within the last `sec` seconds, counted from the tape's most
    /// recent entry (the "now" of a trade-driven window).
    pub fn recent(&mut self, sec: f64) -> Vec<Trade> {
        let now = self.trades.back().map(|t| t.timestamp).unwrap_or(0.0);
        self.evict(now);
        let cutoff = now - sec;
        self.trades
            .iter()
            .filter(|t| t.timestamp >= cutoff)
            .copied()
            .collect()
    }

    pub fn aggregate(&mut self, sec: f64) -> TapeAggregate {
        let trades = self.recent(sec);
        if trades.is_empty() {
            return TapeAggregate::default();
        }

        let mut volume = 0.0;
        let mut buy_vol = 0.0;
        let mut sell_vol = 0.0;
        let mut notional = 0.0;
        let mut min_trade = f64::MAX;
        let mut max_trade = f64::MIN;

        for t in &trades {
            volume += t.size;
            notional += t.price * t.size;
            min_trade = min_trade.min(t.size);
            max_trade = max_trade.max(t.size);
            match t.side {
                TradeSide::Buy => buy_vol += t.size,
                TradeSide::Sell => sell_vol += t.size,
                TradeSide::Unknown => {
                    buy_vol += t.size / 2.0;
                    sell_vol += t.size / 2.0;
                }
            }
        }

        let trade_count = trades.len() as u64;
        TapeAggregate {
            volume,
            trade_count,
            buy_vol,
            sell_vol,
            avg_trade: volume / trade_count as f64,
            min_trade,
            max_trade,
            vwap: if volume > 0.0 { notional / volume } else { 0.0 },
            signed_imb: (buy_vol - sell_vol) / (buy_vol + sell_vol + EPS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn trade(ts: f64, price: f64, size: f64, side: TradeSide) -> Trade {
        Trade {
            timestamp: ts,
            price,
            size,
            side,
        }
    }

    #[test]
    fn empty_tape_aggregate_is_zero() {
        let mut tape = TradeTape::new(300.0);
        assert_eq!(tape.aggregate(60.0), TapeAggregate::default());
    }

    #[test]
    fn add_then_evict_returns_to_zero() {
        let mut tape = TradeTape::new(10.0);
        tape.add(trade(0.0, 100.0, 1.0, TradeSide::Buy));
        tape.add(trade(100.0, 100.0, 1.0, TradeSide::Buy));
        // window span is 10s; by ts=100 the first trade is long evicted and
        // the only remaining trade is outside `recent(1)`'s 1s lookback too.
        let agg = tape.aggregate(1.0);
        assert_eq!(agg.trade_count, 1);
    }

    #[test]
    fn unknown_side_splits_evenly() {
        let mut tape = TradeTape::new(300.0);
        tape.add(trade(0.0, 100.0, 2.0, TradeSide::Unknown));
        let agg = tape.aggregate(60.0);
        assert_eq!(agg.buy_vol, 1.0);
        assert_eq!(agg.sell_vol, 1.0);
        assert_eq!(agg.buy_vol + agg.sell_vol, agg.volume);
    }

    #[test]
    fn buy_sell_volumes_sum_to_total() {
        let mut tape = TradeTape::new(300.0);
        tape.add(trade(0.0, 100.0, 3.0, TradeSide::Buy));
        tape.add(trade(0.0, 100.0, 2.0, TradeSide::Sell));
        let agg = tape.aggregate(60.0);
        assert_eq!(agg.buy_vol, 3.0);
        assert_eq!(agg.sell_vol, 2.0);
        assert_relative_eq!(agg.buy_vol + agg.sell_vol, agg.volume, epsilon = 1e-9);
    }

    #[test]
    fn out_of_order_trade_timestamps_tolerated() {
        let mut tape = TradeTape::new(300.0);
        tape.add(trade(10.0, 100.0, 1.0, TradeSide::Buy));
        tape.add(trade(5.0, 100.0, 1.0, TradeSide::Sell));
        let agg = tape.aggregate(60.0);
        assert_eq!(agg.trade_count, 2);
    }
}
