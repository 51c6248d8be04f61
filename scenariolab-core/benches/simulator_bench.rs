//! Criterion benchmarks for ScenarioLab hot paths.
//!
//! Benchmarks:
//! 1. GBM path generation at increasing step counts
//! 2. Jump-diffusion path generation
//! 3. Hourly market walker (multi-symbol)
//! 4. Risk metric computation over realized return series

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use scenariolab_core::assessment::{calculate_risk_metrics, DEFAULT_RISK_FREE_DAILY};
use scenariolab_core::domain::MarketCondition;
use scenariolab_core::rng::{RandomSource, SeededRandom};
use scenariolab_core::simulator::{
    simulate_geometric_brownian_motion, simulate_jump_diffusion, simulate_market_conditions,
    WalkParams,
};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_conditions(n: usize) -> Vec<MarketCondition> {
    (0..n)
        .map(|i| MarketCondition::new(format!("SYM{i}"), 50.0 + i as f64, 0.25, 1_000_000))
        .collect()
}

fn make_returns(n: usize) -> Vec<f64> {
    let mut rng = SeededRandom::from_seed(99);
    (0..n).map(|_| rng.normal(0.0005, 0.02)).collect()
}

// ── 1. GBM ───────────────────────────────────────────────────────────

fn bench_gbm(c: &mut Criterion) {
    let mut group = c.benchmark_group("gbm");

    for &steps in &[252usize, 720, 8760] {
        group.bench_with_input(BenchmarkId::new("steps", steps), &steps, |b, &steps| {
            let mut rng = SeededRandom::from_seed(42);
            b.iter(|| {
                simulate_geometric_brownian_motion(
                    black_box(100.0),
                    0.05,
                    0.2,
                    1.0,
                    steps,
                    &mut rng,
                )
            });
        });
    }

    group.finish();
}

// ── 2. Jump-diffusion ────────────────────────────────────────────────

fn bench_jump_diffusion(c: &mut Criterion) {
    let mut group = c.benchmark_group("jump_diffusion");

    group.bench_function("720_steps", |b| {
        let mut rng = SeededRandom::from_seed(42);
        b.iter(|| {
            simulate_jump_diffusion(black_box(100.0), 0.05, 0.2, 5.0, -0.05, 0.1, 1.0, 720, &mut rng)
        });
    });

    group.finish();
}

// ── 3. Market walker ─────────────────────────────────────────────────

fn bench_walker(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_walker");
    let params = WalkParams::default();

    for &symbols in &[1usize, 10] {
        let conditions = make_conditions(symbols);
        group.bench_with_input(
            BenchmarkId::new("30_days", symbols),
            &symbols,
            |b, _| {
                let mut rng = SeededRandom::from_seed(7);
                b.iter(|| simulate_market_conditions(black_box(&conditions), 30, &params, &mut rng));
            },
        );
    }

    group.finish();
}

// ── 4. Risk metrics ──────────────────────────────────────────────────

fn bench_risk_metrics(c: &mut Criterion) {
    let mut group = c.benchmark_group("risk_metrics");

    for &n in &[100usize, 720, 10_000] {
        let returns = make_returns(n);
        group.bench_with_input(BenchmarkId::new("returns", n), &n, |b, _| {
            b.iter(|| {
                calculate_risk_metrics(
                    black_box(&returns),
                    black_box(&returns),
                    DEFAULT_RISK_FREE_DAILY,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_gbm,
    bench_jump_diffusion,
    bench_walker,
    bench_risk_metrics
);
criterion_main!(benches);
