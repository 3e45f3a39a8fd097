//! Level-2 order book maintenance.
//!
//! Two price-keyed maps, one per side, with a monotonic sequence number.
//! Every delta application is all-or-nothing: the sequence check and the
//! post-application consistency check both have to pass or the book is
//! left untouched.

use crate::error::OrderBookError;
use crate::time::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single priced level. Prices and sizes are always positive once
/// inserted into a book; a zero-size update removes the level instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrderBookLevel {
    pub price: f64,
    pub size: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Bid,
    Ask,
}

/// Price key ordered so the best level of each side sorts first:
/// descending for bids, ascending for asks.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrderedPrice {
    price: f64,
    side: Side,
}

impl Eq for OrderedPrice {}

impl PartialOrd for OrderedPrice {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedPrice {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match self.side {
            Side::Bid => other
                .price
                .partial_cmp(&self.price)
                .unwrap_or(std::cmp::Ordering::Equal),
            Side::Ask => self
                .price
                .partial_cmp(&other.price)
                .unwrap_or(std::cmp::Ordering::Equal),
        }
    }
}

/// A change to apply as part of `apply_delta`. `size == 0.0` removes the
/// price level.
#[derive(Debug, Clone, Copy)]
pub struct BookChange {
    pub side: Side,
    pub price: f64,
    pub size: f64,
}

/// A derived, point-in-time snapshot of the book's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBookState {
    pub timestamp: Timestamp,
    pub bids: Vec<OrderBookLevel>,
    pub asks: Vec<OrderBookLevel>,
    pub sequence: u64,
}

/// Result of walking a side of the book to fill a target quote-currency
/// amount. `remaining_usd` is nonzero when the book ran out of depth.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthWalk {
    pub avg_price: f64,
    pub remaining_usd: f64,
}

#[derive(Debug, Clone)]
pub struct OrderBook {
    bids: BTreeMap<OrderedPrice, f64>,
    asks: BTreeMap<OrderedPrice, f64>,
    sequence: u64,
    last_update: Timestamp,
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderBook {
    pub fn new() -> Self {
        Self {
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
            sequence: 0,
            last_update: 0.0,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn last_update(&self) -> Timestamp {
        self.last_update
    }

    /// Replaces both sides atomically. Rejects (leaving the book untouched)
    /// when the resulting state has `best_ask <= best_bid`.
    pub fn apply_snapshot(
        &mut self,
        bids: &[OrderBookLevel],
        asks: &[OrderBookLevel],
        seq: u64,
        timestamp: Timestamp,
    ) -> Result<(), OrderBookError> {
        let mut new_bids = BTreeMap::new();
        for lvl in bids {
            if lvl.size > 0.0 {
                new_bids.insert(
                    OrderedPrice {
                        price: lvl.price,
                        side: Side::Bid,
                    },
                    lvl.size,
                );
            }
        }
        let mut new_asks = BTreeMap::new();
        for lvl in asks {
            if lvl.size > 0.0 {
                new_asks.insert(
                    OrderedPrice {
                        price: lvl.price,
                        side: Side::Ask,
                    },
                    lvl.size,
                );
            }
        }
        let best_bid = new_bids.keys().next().map(|k| k.price);
        let best_ask = new_asks.keys().next().map(|k| k.price);
        if let (Some(bb), Some(ba)) = (best_bid, best_ask) {
            if ba <= bb {
                return Err(OrderBookError::OrderbookInconsistent {
                    best_bid: bb,
                    best_ask: ba,
                });
            }
        }
        self.bids = new_bids;
        self.asks = new_asks;
        self.sequence = seq;
        self.last_update = timestamp;
        tracing::debug!(seq, bids = self.bids.len(), asks = self.asks.len(), "snapshot applied");
        Ok(())
    }

    /// Applies a batch of changes only if `seq == self.sequence + 1` and the
    /// resulting book remains consistent; otherwise the book is unchanged.
    pub fn apply_delta(
        &mut self,
        changes: &[BookChange],
        seq: u64,
        timestamp: Timestamp,
    ) -> Result<(), OrderBookError> {
        let expected = self.sequence + 1;
        if seq != expected {
            return Err(OrderBookError::SequenceError {
                expected,
                got: seq,
            });
        }

        let mut trial_bids = self.bids.clone();
        let mut trial_asks = self.asks.clone();
        for change in changes {
            let key = OrderedPrice {
                price: change.price,
                side: change.side,
            };
            let side_map = match change.side {
                Side::Bid => &mut trial_bids,
                Side::Ask => &mut trial_asks,
            };
            if change.size <= 0.0 {
                side_map.remove(&key);
            } else {
                side_map.insert(key, change.size);
            }
        }

        let best_bid = trial_bids.keys().next().map(|k| k.price);
        let best_ask = trial_asks.keys().next().map(|k| k.price);
        if let (Some(bb), Some(ba)) = (best_bid, best_ask) {
            if ba <= bb {
                return Err(OrderBookError::OrderbookInconsistent {
                    best_bid: bb,
                    best_ask: ba,
                });
            }
        }

        self.bids = trial_bids;
        self.asks = trial_asks;
        self.sequence = seq;
        self.last_update = timestamp;
        Ok(())
    }

    pub fn best_bid(&self) -> Option<f64> {
        self.bids.keys().next().map(|k| k.price)
    }

    pub fn best_ask(&self) -> Option<f64> {
        self.asks.keys().next().map(|k| k.price)
    }

    pub fn top_bid_size(&self) -> f64 {
        self.bids.values().next().copied().unwrap_or(0.0)
    }

    pub fn top_ask_size(&self) -> f64 {
        self.asks.values().next().copied().unwrap_or(0.0)
    }

    pub fn mid(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => (b + a) / 2.0,
            _ => 0.0,
        }
    }

    pub fn spread(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(b), Some(a)) => a - b,
            _ => 0.0,
        }
    }

    pub fn spread_bps(&self) -> f64 {
        let mid = self.mid();
        if mid <= 0.0 {
            0.0
        } else {
            10_000.0 * self.spread() / mid
        }
    }

    /// The first `n` levels of `side`, best level first.
    pub fn top_n(&self, side: Side, n: usize) -> Vec<OrderBookLevel> {
        let map = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        };
        map.iter()
            .take(n)
            .map(|(k, v)| OrderBookLevel {
                price: k.price,
                size: *v,
            })
            .collect()
    }

    /// Sum of price*size across the top `n` levels of `side`, in quote units.
    pub fn depth_usd(&self, side: Side, n: usize) -> f64 {
        self.top_n(side, n)
            .iter()
            .map(|l| l.price * l.size)
            .sum()
    }

    /// Walks `side` consuming `target_usd` of notional, returning the
    /// size-weighted average fill price and whatever notional could not be
    /// filled. Invariant #3: an empty side returns `(0.0, target_usd)`.
    pub fn depth_to_price(&self, side: Side, target_usd: f64) -> DepthWalk {
        let map = match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        };
        if map.is_empty() {
            return DepthWalk {
                avg_price: 0.0,
                remaining_usd: target_usd,
            };
        }

        let mut remaining = target_usd;
        let mut filled_usd = 0.0;
        let mut filled_qty = 0.0;
        for (key, size) in map.iter() {
            if remaining <= 0.0 {
                break;
            }
            let level_usd = key.price * size;
            let take_usd = level_usd.min(remaining);
            let take_qty = take_usd / key.price;
            filled_usd += take_usd;
            filled_qty += take_qty;
            remaining -= take_usd;
        }

        let avg_price = if filled_qty > 0.0 {
            filled_usd / filled_qty
        } else {
            0.0
        };
        DepthWalk {
            avg_price,
            remaining_usd: remaining.max(0.0),
        }
    }

    pub fn to_state(&self) -> OrderBookState {
        OrderBookState {
            timestamp: self.last_update,
            bids: self.top_n(Side::Bid, self.bids.len()),
            asks: self.top_n(Side::Ask, self.asks.len()),
            sequence: self.sequence,
        }
    }
}
