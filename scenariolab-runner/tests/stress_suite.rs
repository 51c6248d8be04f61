use proptest::prelude::*;

use scenariolab_core::domain::{ScenarioId, Severity, StressTestScenario, StressType};
use scenariolab_core::rng::{SeedHierarchy, SequenceSource};
use scenariolab_runner::stress::{stress_impact_score, StressTester};
use scenariolab_runner::{
    stress_test_templates, EngineConfig, InMemoryScenarioStore, Orchestrator, ScenarioError,
};

fn scenario_id() -> ScenarioId {
    ScenarioId::new("stress-target")
}

#[test]
fn severe_shocks_lose_more_than_mild_ones_on_the_same_draws() {
    // Every normal draw is the same negative value, so the paths differ only
    // through the shocked volatility. Rate shocks move only the starting
    // price and are covered by `rate_shock_severity_leaves_returns_unchanged`.
    let tester = StressTester::default();
    for stress_type in [StressType::VolatilitySpike, StressType::MarketCrash] {
        let mild = StressTestScenario::new("mild", stress_type, Severity::Mild);
        let severe = StressTestScenario::new("severe", stress_type, Severity::Severe);

        let mut rng = SequenceSource::new(vec![0.5, 0.5]);
        let mild = tester.run(&scenario_id(), &mild, &mut rng).unwrap();
        let mut rng = SequenceSource::new(vec![0.5, 0.5]);
        let severe = tester.run(&scenario_id(), &severe, &mut rng).unwrap();

        assert!(
            severe.max_loss < mild.max_loss,
            "{stress_type}: severe {} vs mild {}",
            severe.max_loss,
            mild.max_loss
        );
        assert!(severe.stress_impact_score <= mild.stress_impact_score);
    }
}

#[test]
fn rate_shock_severity_leaves_returns_unchanged() {
    // The shock rescales the starting price; simple returns are scale-free.
    let tester = StressTester::default();
    let mild = StressTestScenario::new("rates", StressType::InterestRateChange, Severity::Mild);
    let severe =
        StressTestScenario::new("rates", StressType::InterestRateChange, Severity::Severe);

    let mut rng = SequenceSource::new(vec![0.3, 0.7, 0.55]);
    let mild = tester.run(&scenario_id(), &mild, &mut rng).unwrap();
    let mut rng = SequenceSource::new(vec![0.3, 0.7, 0.55]);
    let severe = tester.run(&scenario_id(), &severe, &mut rng).unwrap();

    assert!((mild.total_return - severe.total_return).abs() < 1e-9);
    assert!((mild.max_loss - severe.max_loss).abs() < 1e-9);
    assert!((mild.risk_metrics.var95 - severe.risk_metrics.var95).abs() < 1e-9);
}

#[test]
fn severity_ordering_holds_on_average_across_seeds() {
    let tester = StressTester::default();
    let mut mild_total = 0.0;
    let mut severe_total = 0.0;
    for seed in 0..10 {
        let seeds = SeedHierarchy::new(seed);
        let mild = StressTestScenario::new("spike", StressType::VolatilitySpike, Severity::Mild);
        let severe =
            StressTestScenario::new("spike", StressType::VolatilitySpike, Severity::Severe);
        let mut rng = seeds.source_for("avg", "spike", 0);
        mild_total += tester.run(&scenario_id(), &mild, &mut rng).unwrap().max_loss;
        let mut rng = seeds.source_for("avg", "spike", 0);
        severe_total += tester.run(&scenario_id(), &severe, &mut rng).unwrap().max_loss;
    }
    assert!(severe_total < mild_total);
}

#[test]
fn parallel_suite_matches_sequential_suite() {
    let seeds = SeedHierarchy::new(2024);
    let templates = stress_test_templates();

    let sequential = StressTester::default()
        .with_parallelism(false)
        .run_suite(&scenario_id(), &templates, &seeds)
        .unwrap();
    let parallel = StressTester::default()
        .with_parallelism(true)
        .run_suite(&scenario_id(), &templates, &seeds)
        .unwrap();

    assert_eq!(sequential, parallel);
    let names: Vec<&str> = parallel
        .iter()
        .map(|r| r.stress_scenario.name.as_str())
        .collect();
    assert_eq!(
        names,
        [
            "Financial Crisis",
            "Pandemic Crash",
            "Interest Rate Shock",
            "Flash Crash",
            "Volatility Spike"
        ]
    );
}

#[test]
fn every_template_produces_a_bounded_score() {
    let results = StressTester::default()
        .run_suite(&scenario_id(), &stress_test_templates(), &SeedHierarchy::new(8))
        .unwrap();
    for r in &results {
        assert!((0.0..=100.0).contains(&r.stress_impact_score));
        assert!(r.max_loss <= 0.0);
        assert!(r.recovery_time <= 30 * 24);
        assert_eq!(r.scenario_id, scenario_id());
    }
}

#[test]
fn orchestrator_stress_requires_an_existing_scenario() {
    let config = EngineConfig {
        seed: Some(1),
        ..EngineConfig::default()
    };
    let orch = Orchestrator::new(config, InMemoryScenarioStore::new()).unwrap();
    let stress = StressTestScenario::new("crash", StressType::MarketCrash, Severity::Moderate);

    assert!(matches!(
        orch.run_stress_test(&ScenarioId::new("ghost"), &stress),
        Err(ScenarioError::NotFound(_))
    ));
    assert!(matches!(
        orch.run_stress_suite(&ScenarioId::new("ghost"), &[stress]),
        Err(ScenarioError::NotFound(_))
    ));
}

#[test]
fn overridden_crash_factor_that_wipes_out_the_price_is_rejected() {
    let stress = StressTestScenario::new("wipeout", StressType::MarketCrash, Severity::Severe)
        .with_param("crash_factor", 0.6);
    let mut rng = SequenceSource::new(vec![0.5, 0.5]);
    assert!(StressTester::default()
        .run(&scenario_id(), &stress, &mut rng)
        .is_err());
}

proptest! {
    #[test]
    fn impact_score_is_always_in_range(
        total_return in -5.0f64..5.0,
        max_loss in -5.0f64..0.0,
        var95 in 0.0f64..5.0,
    ) {
        let score = stress_impact_score(total_return, max_loss, var95);
        prop_assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn worse_total_return_never_raises_the_score(
        total_return in -1.0f64..1.0,
        delta in 0.0f64..1.0,
        max_loss in -1.0f64..0.0,
        var95 in 0.0f64..1.0,
    ) {
        let better = stress_impact_score(total_return, max_loss, var95);
        let worse = stress_impact_score(total_return - delta, max_loss, var95);
        prop_assert!(worse <= better + 1e-12);
    }
}
