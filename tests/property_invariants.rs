//! Property-based tests for the numeric invariants listed in SPEC_FULL.md
//! §8. These use proptest to verify the invariants across randomized
//! inputs rather than a handful of hand-picked cases.

use proptest::prelude::*;
use toxictide_core::{
    FeatureEngine, OrderBook, OrderBookLevel, RollingMad, Side, Trade, TradeSide, TradeTape,
    DEFAULT_TAPE_WINDOW_SEC,
};

const IMPACT_UNFILLABLE_BPS: f64 = 9999.9;

fn price_strategy() -> impl Strategy<Value = f64> {
    1.0..10_000.0_f64
}

fn size_strategy() -> impl Strategy<Value = f64> {
    0.01..1_000.0_f64
}

proptest! {
    /// Invariant 1: after `apply_snapshot` succeeds, best_ask > best_bid
    /// whenever both sides are non-empty.
    #[test]
    fn snapshot_keeps_ask_above_bid_when_it_succeeds(
        bid_price in price_strategy(),
        ask_offset in 0.01..500.0_f64,
        bid_size in size_strategy(),
        ask_size in size_strategy(),
    ) {
        let mut book = OrderBook::new();
        let ask_price = bid_price + ask_offset;
        let result = book.apply_snapshot(
            &[OrderBookLevel { price: bid_price, size: bid_size }],
            &[OrderBookLevel { price: ask_price, size: ask_size }],
            1,
            0.0,
        );
        prop_assert!(result.is_ok());
        prop_assert!(book.best_ask().unwrap() > book.best_bid().unwrap());
    }

    /// Invariant 3: `depth_to_price` on an empty side always returns
    /// avg_price=0 and remaining=target; on a non-empty side, remaining is
    /// never negative.
    #[test]
    fn depth_to_price_never_returns_negative_remaining(
        levels in prop::collection::vec((price_strategy(), size_strategy()), 0..10),
        target_usd in 0.0..100_000.0_f64,
    ) {
        let mut book = OrderBook::new();
        let asks: Vec<OrderBookLevel> = levels
            .iter()
            .enumerate()
            .map(|(i, &(p, s))| OrderBookLevel { price: p + i as f64, size: s })
            .collect();
        if !asks.is_empty() {
            book.apply_snapshot(&[OrderBookLevel { price: 0.5, size: 1.0 }], &asks, 1, 0.0).unwrap();
        }
        let walk = book.depth_to_price(Side::Ask, target_usd);
        prop_assert!(walk.remaining_usd >= 0.0);
        if asks.is_empty() {
            prop_assert_eq!(walk.avg_price, 0.0);
            prop_assert_eq!(walk.remaining_usd, target_usd);
        }
    }

    /// Invariant 4: a fully-filled impact walk reports a non-negative bps
    /// figure; an unfillable one reports exactly the sentinel.
    #[test]
    fn impact_is_nonnegative_or_exactly_the_sentinel(
        ask_size in size_strategy(),
        impact_size_usd in 1.0..50_000.0_f64,
    ) {
        let mut book = OrderBook::new();
        book.apply_snapshot(
            &[OrderBookLevel { price: 99.0, size: 10.0 }],
            &[OrderBookLevel { price: 100.0, size: ask_size }],
            1,
            0.0,
        ).unwrap();
        let mut tape = TradeTape::new(300.0);
        let mut engine = FeatureEngine::new(impact_size_usd, DEFAULT_TAPE_WINDOW_SEC);
        let v = engine.compute(&book, &mut tape, 0.0);
        prop_assert!(v.impact_buy_bps == IMPACT_UNFILLABLE_BPS || v.impact_buy_bps >= 0.0);
    }

    /// Invariant 5: every FeatureVector keeps imb_k in [-1, 1] and toxic in
    /// [0, 1] regardless of book/tape shape.
    #[test]
    fn feature_vector_bounds_always_hold(
        bid_size in size_strategy(),
        ask_size in size_strategy(),
        trade_sizes in prop::collection::vec(size_strategy(), 0..20),
    ) {
        let mut book = OrderBook::new();
        book.apply_snapshot(
            &[OrderBookLevel { price: 99.0, size: bid_size }],
            &[OrderBookLevel { price: 100.0, size: ask_size }],
            1,
            0.0,
        ).unwrap();
        let mut tape = TradeTape::new(300.0);
        for (i, size) in trade_sizes.iter().enumerate() {
            let side = if i % 2 == 0 { TradeSide::Buy } else { TradeSide::Sell };
            tape.add(Trade { timestamp: 0.0, price: 100.0, size: *size, side });
        }
        let mut engine = FeatureEngine::new(500.0, DEFAULT_TAPE_WINDOW_SEC);
        let v = engine.compute(&book, &mut tape, 1.0);
        prop_assert!(v.imb_k >= -1.0 && v.imb_k <= 1.0);
        prop_assert!(v.toxic >= 0.0 && v.toxic <= 1.0);
        prop_assert!(v.spread_bps >= 0.0);
    }

    /// Invariant 6: buy_vol + sell_vol equals total volume for a batch of
    /// known-side trades.
    #[test]
    fn tape_aggregate_conserves_volume(
        trades in prop::collection::vec((size_strategy(), any::<bool>()), 1..30),
    ) {
        let mut tape = TradeTape::new(300.0);
        for (i, (size, is_buy)) in trades.iter().enumerate() {
            let side = if *is_buy { TradeSide::Buy } else { TradeSide::Sell };
            tape.add(Trade { timestamp: i as f64, price: 100.0, size: *size, side });
        }
        let agg = tape.aggregate(300.0);
        prop_assert!((agg.buy_vol + agg.sell_vol - agg.volume).abs() < 1e-6);
    }

    /// Invariant 7: RollingMAD with identical values returns z=0 regardless
    /// of how many points have been recorded.
    #[test]
    fn rolling_mad_identical_values_always_zero_z(
        value in -1000.0..1000.0_f64,
        n in 1usize..50,
    ) {
        let mut mad = RollingMad::new(1000.0);
        let mut last_z = 1.0;
        for i in 0..n {
            last_z = mad.update("x", i as f64, value).z;
        }
        prop_assert_eq!(last_z, 0.0);
    }
}
