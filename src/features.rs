//! Produces a fixed-shape [`FeatureVector`] from book + tape at a given
//! timestamp, including price-impact estimation.

use crate::orderbook::{OrderBook, Side};
use crate::time::Timestamp;
use crate::trade_tape::TradeTape;
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-9;
/// Sentinel reported when a side can't fully absorb the configured impact
/// size, rather than an `Option`.
pub const IMPACT_UNFILLABLE_BPS: f64 = 9999.9;
const TOP_K: usize = 20;
/// Default tape aggregation window backing the `vol`/`trades`/`toxic`
/// fields (SPEC_FULL.md §4.4), used unless `FeatureEngine::new` is given a
/// different one via `EngineConfig::tape_feature_window_sec`.
pub const DEFAULT_TAPE_WINDOW_SEC: f64 = 60.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub timestamp: Timestamp,
    pub mid: f64,
    pub spread: f64,
    pub spread_bps: f64,
    pub top_bid_sz: f64,
    pub top_ask_sz: f64,
    pub depth_bid_k: f64,
    pub depth_ask_k: f64,
    pub imb_k: f64,
    pub micro_minus_mid: f64,
    pub impact_buy_bps: f64,
    pub impact_sell_bps: f64,
    pub msg_rate: f64,
    pub churn: f64,
    pub vol: f64,
    pub trades: u64,
    pub avg_trade: f64,
    pub max_trade: f64,
    pub signed_imb: f64,
    pub toxic: f64,
}

impl FeatureVector {
    /// The side-matched impact a long/short candidate would pay entering
    /// now: buys consume the ask side, shorts the bid side.
    pub fn impact_for_side(&self, side: crate::candidate::CandidateSide) -> f64 {
        match side {
            crate::candidate::CandidateSide::Long => self.impact_buy_bps,
            crate::candidate::CandidateSide::Short => self.impact_sell_bps,
        }
    }
}

fn sentinel_vector(timestamp: Timestamp) -> FeatureVector {
    FeatureVector {
        timestamp,
        mid: 0.0,
        spread: 0.0,
        spread_bps: 0.0,
        top_bid_sz: 0.0,
        top_ask_sz: 0.0,
        depth_bid_k: 0.0,
        depth_ask_k: 0.0,
        imb_k: 0.0,
        micro_minus_mid: 0.0,
        impact_buy_bps: IMPACT_UNFILLABLE_BPS,
        impact_sell_bps: IMPACT_UNFILLABLE_BPS,
        msg_rate: 0.0,
        churn: 0.0,
        vol: 0.0,
        trades: 0,
        avg_trade: 0.0,
        max_trade: 0.0,
        signed_imb: 0.0,
        toxic: 0.0,
    }
}

/// Computes impact in bps of walking `side` to absorb `target_usd`,
/// relative to `mid`. Returns the sentinel when depth runs out.
fn impact_bps(book: &OrderBook, side: Side, mid: f64, target_usd: f64) -> f64 {
    if mid <= 0.0 {
        return IMPACT_UNFILLABLE_BPS;
    }
    let walk = book.depth_to_price(side, target_usd);
    if walk.remaining_usd > EPS || walk.avg_price <= 0.0 {
        return IMPACT_UNFILLABLE_BPS;
    }
    (10_000.0 * (walk.avg_price - mid).abs() / mid).max(0.0)
}

pub struct FeatureEngine {
    impact_size_quote_usd: f64,
    tape_window_sec: f64,
    invocation_count: u64,
    start_time: Option<Timestamp>,
    prev_depth: Option<(f64, f64)>,
}

impl FeatureEngine {
    /// `tape_window_sec` is the lookback the `vol`/`trades`/`avg_trade`/
    /// `max_trade`/`signed_imb`/`toxic` fields aggregate over — pass
    /// [`DEFAULT_TAPE_WINDOW_SEC`] for the spec default, or
    /// `EngineConfig::tape_feature_window_sec` to make it configurable.
    pub fn new(impact_size_quote_usd: f64, tape_window_sec: f64) -> Self {
        Self {
            impact_size_quote_usd,
            tape_window_sec,
            invocation_count: 0,
            start_time: None,
            prev_depth: None,
        }
    }

    /// Resets the message-rate counter's clock, as if the engine had just
    /// been constructed.
    pub fn reset_rate_clock(&mut self, now: Timestamp) {
        self.invocation_count = 0;
        self.start_time = Some(now);
    }

    pub fn compute(&mut self, book: &OrderBook, tape: &mut TradeTape, now: Timestamp) -> FeatureVector {
        self.invocation_count += 1;
        let start = *self.start_time.get_or_insert(now);
        let elapsed = (now - start).max(EPS);
        let msg_rate = self.invocation_count as f64 / elapsed;

        let best_bid = book.best_bid();
        let best_ask = book.best_ask();
        if best_bid.is_none() || best_ask.is_none() {
            let mut v = sentinel_vector(now);
            v.msg_rate = msg_rate;
            return v;
        }

        let mid = book.mid();
        let spread = book.spread();
        let spread_bps = book.spread_bps();
        let top_bid_sz = book.top_bid_size();
        let top_ask_sz = book.top_ask_size();

        let bid_levels = book.top_n(Side::Bid, TOP_K);
        let ask_levels = book.top_n(Side::Ask, TOP_K);
        let depth_bid_k: f64 = bid_levels.iter().map(|l| l.price * l.size).sum();
        let depth_ask_k: f64 = ask_levels.iter().map(|l| l.price * l.size).sum();
        let imb_k = (depth_bid_k - depth_ask_k) / (depth_bid_k + depth_ask_k + EPS);

        let best_bid = best_bid.unwrap();
        let best_ask = best_ask.unwrap();
        let micro = (best_ask * top_bid_sz + best_bid * top_ask_sz) / (top_bid_sz + top_ask_sz + EPS);
        let micro_minus_mid = micro - mid;

        let impact_buy_bps = impact_bps(book, Side::Ask, mid, self.impact_size_quote_usd);
        let impact_sell_bps = impact_bps(book, Side::Bid, mid, self.impact_size_quote_usd);

        let agg = tape.aggregate(self.tape_window_sec);
        let toxic = agg.signed_imb.abs().min(1.0);

        let churn = match self.prev_depth {
            Some((pb, pa)) => (depth_bid_k - pb).abs() + (depth_ask_k - pa).abs(),
            None => 0.0,
        };
        self.prev_depth = Some((depth_bid_k, depth_ask_k));

        FeatureVector {
            timestamp: now,
            mid,
            spread,
            spread_bps,
            top_bid_sz,
            top_ask_sz,
            depth_bid_k,
            depth_ask_k,
            imb_k: imb_k.clamp(-1.0, 1.0),
            micro_minus_mid,
            impact_buy_bps,
            impact_sell_bps,
            msg_rate,
            churn,
            vol: agg.volume,
            trades: agg.trade_count,
            avg_trade: agg.avg_trade,
            max_trade: agg.max_trade,
            signed_imb: agg.signed_imb,
            toxic,
        }
    }
}
