//! Property tests for simulator and risk invariants.
//!
//! Uses proptest to verify:
//! 1. Path shape — GBM / jump-diffusion paths have `steps + 1` positive prices
//! 2. Walker shape — `symbols × (days × 24 + 1)` points, prices above the floor
//! 3. Risk ordering — `0 <= var95 <= var99` and `expected_shortfall >= var95`
//! 4. Drawdown — non-negative, zero for non-decreasing cumulative series
//! 5. Strategy direction — long and short returns mirror each other

use proptest::prelude::*;
use scenariolab_core::assessment::{calculate_risk_metrics, DEFAULT_RISK_FREE_DAILY};
use scenariolab_core::domain::{MarketCondition, StrategyKind, TradingStrategy};
use scenariolab_core::rng::SeededRandom;
use scenariolab_core::simulator::{
    simulate_geometric_brownian_motion, simulate_jump_diffusion, simulate_market_conditions,
    WalkParams,
};
use scenariolab_core::stats::max_drawdown;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..1000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_volatility() -> impl Strategy<Value = f64> {
    0.0..1.5_f64
}

fn arb_returns() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.2..0.2_f64, 1..200)
}

// ── 1. Path shape ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn gbm_path_shape(
        price in arb_price(),
        drift in -0.5..0.5_f64,
        vol in arb_volatility(),
        steps in 1usize..500,
        seed in any::<u64>(),
    ) {
        let mut rng = SeededRandom::from_seed(seed);
        let path = simulate_geometric_brownian_motion(price, drift, vol, 1.0, steps, &mut rng).unwrap();
        prop_assert_eq!(path.len(), steps + 1);
        prop_assert_eq!(path[0], price);
        prop_assert!(path.iter().all(|p| *p > 0.0 && p.is_finite()));
    }

    #[test]
    fn jump_diffusion_path_shape(
        price in arb_price(),
        vol in arb_volatility(),
        intensity in 0.0..50.0_f64,
        steps in 1usize..300,
        seed in any::<u64>(),
    ) {
        let mut rng = SeededRandom::from_seed(seed);
        let path = simulate_jump_diffusion(price, 0.05, vol, intensity, -0.1, 0.05, 1.0, steps, &mut rng).unwrap();
        prop_assert_eq!(path.len(), steps + 1);
        prop_assert_eq!(path[0], price);
        prop_assert!(path.iter().all(|p| *p > 0.0));
    }
}

// ── 2. Walker shape ──────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn walker_shape(
        prices in prop::collection::vec(arb_price(), 1..4),
        vol in arb_volatility(),
        days in 1u32..4,
        seed in any::<u64>(),
    ) {
        let initial: Vec<MarketCondition> = prices
            .iter()
            .enumerate()
            .map(|(i, p)| MarketCondition::new(format!("S{i}"), *p, vol, 1_000_000))
            .collect();
        let mut rng = SeededRandom::from_seed(seed);
        let out = simulate_market_conditions(&initial, days, &WalkParams::default(), &mut rng).unwrap();

        let per_symbol = days as usize * 24 + 1;
        prop_assert_eq!(out.len(), initial.len() * per_symbol);
        prop_assert!(out.iter().all(|c| c.price >= 0.01));
        for (i, chunk) in out.chunks(per_symbol).enumerate() {
            prop_assert_eq!(&chunk[0], &initial[i]);
            prop_assert!(chunk.iter().all(|c| c.symbol == initial[i].symbol));
        }
    }
}

// ── 3. Risk ordering ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn risk_ordering(returns in arb_returns()) {
        let m = calculate_risk_metrics(&returns, &returns, DEFAULT_RISK_FREE_DAILY);
        prop_assert!(m.var95 >= 0.0);
        prop_assert!(m.var99 >= m.var95);
        prop_assert!(m.expected_shortfall >= m.var95);
        prop_assert!(m.max_drawdown >= 0.0);
    }

    #[test]
    fn beta_against_itself_is_one_when_varied(returns in prop::collection::vec(-0.2..0.2_f64, 2..100)) {
        let spread = returns.iter().cloned().fold(f64::MIN, f64::max)
            - returns.iter().cloned().fold(f64::MAX, f64::min);
        prop_assume!(spread > 1e-6);
        let m = calculate_risk_metrics(&returns, &returns, DEFAULT_RISK_FREE_DAILY);
        prop_assert!((m.beta - 1.0).abs() < 1e-9);
        prop_assert!(m.alpha.abs() < 1e-9);
    }
}

// ── 4. Drawdown ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn drawdown_non_negative(returns in arb_returns()) {
        prop_assert!(max_drawdown(&returns) >= 0.0);
    }

    #[test]
    fn drawdown_zero_for_gains(returns in prop::collection::vec(0.0..0.2_f64, 0..200)) {
        prop_assert_eq!(max_drawdown(&returns), 0.0);
    }

    #[test]
    fn drawdown_bounded_by_total_losses(returns in arb_returns()) {
        let losses: f64 = returns.iter().filter(|r| **r < 0.0).map(|r| -r).sum();
        prop_assert!(max_drawdown(&returns) <= losses + 1e-12);
    }
}

// ── 5. Strategy direction ────────────────────────────────────────────

proptest! {
    #[test]
    fn long_and_short_mirror(
        entry in arb_price(),
        exit in arb_price(),
        qty in 0.1..100.0_f64,
    ) {
        let long = TradingStrategy::new("l", "X", StrategyKind::Long, entry, qty);
        let short = TradingStrategy::new("s", "X", StrategyKind::Short, entry, qty);
        let neutral = TradingStrategy::new("n", "X", StrategyKind::Neutral, entry, qty);

        let rl = long.return_at(exit);
        let rs = short.return_at(exit);
        prop_assert!((rl + rs).abs() < 1e-9);
        prop_assert_eq!(neutral.return_at(exit), 0.0);
        if exit > entry {
            prop_assert!(rl > 0.0);
        }
    }
}
