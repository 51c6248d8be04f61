//! Scenario orchestrator — owns scenario records and drives runs.
//!
//! A run walks `pending → running → completed | failed`:
//! simulate market conditions, evaluate strategies, assess risk from the
//! realized strategy returns, then persist. The registry lock is held only
//! for state transitions, never across simulation or I/O, and a scenario that
//! is already `running` rejects a second run.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use rayon::prelude::*;
use thiserror::Error;

use scenariolab_core::assessment::calculate_risk_metrics;
use scenariolab_core::domain::{
    MarketCondition, RiskAssessment, Scenario, ScenarioId, ScenarioParameters, ScenarioResult,
    ScenarioStatus, StressTestResult, StressTestScenario, ValidationError,
};
use scenariolab_core::rng::{SeedHierarchy, SeededRandom};
use scenariolab_core::simulator::{simulate_market_conditions, SimulationError, SimulationModel};

use crate::config::EngineConfig;
use crate::evaluator::{evaluate_strategies, EvaluationError};
use crate::store::{ScenarioStore, StoreError};
use crate::stress::{StressError, StressTester};

/// Errors from orchestrator operations.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario parameters: {0}")]
    Validation(#[from] ValidationError),
    #[error("scenario '{0}' not found")]
    NotFound(ScenarioId),
    #[error("scenario '{0}' is already running")]
    AlreadyRunning(ScenarioId),
    #[error("scenario '{0}' has no risk assessment yet")]
    NotAssessed(ScenarioId),
    #[error("simulation failed: {0}")]
    Simulation(#[from] SimulationError),
    #[error("strategy evaluation failed: {0}")]
    Evaluation(#[from] EvaluationError),
    #[error("stress test failed: {0}")]
    Stress(#[from] StressError),
    /// The run computed a result but it could not be stored. The scenario is
    /// marked failed; the result is handed back so nothing is lost.
    #[error("result for scenario '{id}' could not be persisted: {source}")]
    Persistence {
        id: ScenarioId,
        #[source]
        source: StoreError,
        result: Box<ScenarioResult>,
    },
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
    #[error("scenario registry lock poisoned")]
    Poisoned,
}

pub struct Orchestrator<S: ScenarioStore> {
    config: EngineConfig,
    store: S,
    scenarios: Mutex<HashMap<ScenarioId, Scenario>>,
    seeds: Option<SeedHierarchy>,
    stress: StressTester,
}

impl<S: ScenarioStore> Orchestrator<S> {
    /// Build an orchestrator over `store`, loading any scenarios it holds.
    ///
    /// Scenarios persisted as `running` belong to a run that never finished;
    /// they are loaded as `failed`.
    pub fn new(config: EngineConfig, store: S) -> Result<Self, ScenarioError> {
        let mut scenarios = HashMap::new();
        for mut scenario in store.list_scenarios()? {
            if scenario.status == ScenarioStatus::Running {
                tracing::warn!(scenario = %scenario.id, "found interrupted run, marking failed");
                scenario.transition(ScenarioStatus::Failed);
                scenario.results = None;
                scenario.error = Some("run interrupted".to_string());
                store.save_scenario(&scenario)?;
                store.delete_assessment(&scenario.id)?;
            }
            scenarios.insert(scenario.id.clone(), scenario);
        }

        Ok(Self {
            seeds: config.seed.map(SeedHierarchy::new),
            stress: StressTester::from_config(&config),
            config,
            store,
            scenarios: Mutex::new(scenarios),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn registry(&self) -> Result<MutexGuard<'_, HashMap<ScenarioId, Scenario>>, ScenarioError> {
        self.scenarios.lock().map_err(|_| ScenarioError::Poisoned)
    }

    fn rng_for(&self, scope: &str, stream: &str) -> SeededRandom {
        match &self.seeds {
            Some(seeds) => seeds.source_for(scope, stream, 0),
            None => SeededRandom::from_entropy(),
        }
    }

    /// Validate and store new parameters as a `pending` scenario.
    pub fn create_scenario(&self, parameters: ScenarioParameters) -> Result<Scenario, ScenarioError> {
        parameters.validate()?;
        let scenario = Scenario::new(ScenarioId::generate(), parameters);
        self.store.save_scenario(&scenario)?;
        self.registry()?.insert(scenario.id.clone(), scenario.clone());
        tracing::info!(scenario = %scenario.id, name = %scenario.parameters.name, "scenario created");
        Ok(scenario)
    }

    pub fn get_scenario(&self, id: &ScenarioId) -> Result<Scenario, ScenarioError> {
        self.registry()?
            .get(id)
            .cloned()
            .ok_or_else(|| ScenarioError::NotFound(id.clone()))
    }

    /// All scenarios, oldest first.
    pub fn list_scenarios(&self) -> Result<Vec<Scenario>, ScenarioError> {
        let mut all: Vec<Scenario> = self.registry()?.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    /// Remove a scenario and its assessment. A running scenario cannot be deleted.
    pub fn delete_scenario(&self, id: &ScenarioId) -> Result<(), ScenarioError> {
        let mut registry = self.registry()?;
        match registry.get(id) {
            None => return Err(ScenarioError::NotFound(id.clone())),
            Some(s) if s.status == ScenarioStatus::Running => {
                return Err(ScenarioError::AlreadyRunning(id.clone()))
            }
            Some(_) => {}
        }
        self.store.delete_scenario(id)?;
        registry.remove(id);
        tracing::info!(scenario = %id, "scenario deleted");
        Ok(())
    }

    /// Run a scenario end to end.
    pub fn run_scenario(&self, id: &ScenarioId) -> Result<ScenarioResult, ScenarioError> {
        let (parameters, running) = {
            let mut registry = self.registry()?;
            let scenario = registry
                .get_mut(id)
                .ok_or_else(|| ScenarioError::NotFound(id.clone()))?;
            if scenario.status == ScenarioStatus::Running {
                return Err(ScenarioError::AlreadyRunning(id.clone()));
            }
            scenario.transition(ScenarioStatus::Running);
            scenario.error = None;
            (scenario.parameters.clone(), scenario.clone())
        };

        let _span = tracing::info_span!("scenario_run", scenario = %id).entered();
        tracing::info!(
            symbols = parameters.market_conditions.len(),
            strategies = parameters.strategies.len(),
            days = parameters.duration_days,
            "scenario running"
        );
        if let Err(e) = self.store.save_scenario(&running) {
            tracing::warn!(error = %e, "could not persist running status");
        }

        match self.compute(id, &parameters) {
            Ok(result) => self.complete(id, result),
            Err(e) => {
                self.mark_failed(id, &e);
                Err(e)
            }
        }
    }

    /// Simulation, evaluation and risk assessment; no state is touched here.
    fn compute(
        &self,
        id: &ScenarioId,
        parameters: &ScenarioParameters,
    ) -> Result<ScenarioResult, ScenarioError> {
        let mut rng = self.rng_for(id.as_str(), "market");
        let conditions = simulate_market_conditions(
            &parameters.market_conditions,
            parameters.duration_days,
            &self.config.simulation,
            &mut rng,
        )?;

        let evaluation = evaluate_strategies(&parameters.strategies, &conditions)?;
        let risk_metrics = calculate_risk_metrics(
            &evaluation.strategy_returns,
            &evaluation.benchmark_returns,
            self.config.risk.risk_free_daily(),
        );

        Ok(ScenarioResult {
            scenario_id: id.clone(),
            total_return: evaluation.total_return,
            max_drawdown: evaluation.max_drawdown,
            sharpe_ratio: evaluation.sharpe_ratio,
            volatility: evaluation.volatility,
            win_rate: evaluation.win_rate,
            profit_factor: evaluation.profit_factor,
            risk_metrics,
            strategy_returns: evaluation.strategy_returns,
            completed_at: Utc::now(),
        })
    }

    /// Persist the result and assessment; only then mark the scenario completed.
    fn complete(
        &self,
        id: &ScenarioId,
        result: ScenarioResult,
    ) -> Result<ScenarioResult, ScenarioError> {
        let mut completed = self.get_scenario(id)?;
        completed.results = Some(result.clone());
        completed.error = None;
        completed.transition(ScenarioStatus::Completed);

        let assessment = RiskAssessment {
            scenario_id: id.clone(),
            metrics: result.risk_metrics,
            assessed_at: result.completed_at,
        };

        let persisted = self
            .store
            .save_assessment(&assessment)
            .and_then(|()| self.store.save_scenario(&completed));

        match persisted {
            Ok(()) => {
                self.registry()?.insert(id.clone(), completed);
                tracing::info!(
                    total_return = result.total_return,
                    var95 = result.risk_metrics.var95,
                    "scenario completed"
                );
                Ok(result)
            }
            Err(source) => {
                let err = ScenarioError::Persistence {
                    id: id.clone(),
                    source,
                    result: Box::new(result),
                };
                self.mark_failed(id, &err);
                Err(err)
            }
        }
    }

    fn mark_failed(&self, id: &ScenarioId, error: &ScenarioError) {
        tracing::warn!(error = %error, "scenario failed");
        let failed = match self.registry() {
            Ok(mut registry) => registry.get_mut(id).map(|scenario| {
                scenario.results = None;
                scenario.error = Some(error.to_string());
                scenario.transition(ScenarioStatus::Failed);
                scenario.clone()
            }),
            Err(_) => None,
        };
        if let Some(scenario) = failed {
            if let Err(e) = self.store.save_scenario(&scenario) {
                tracing::warn!(error = %e, "could not persist failed status");
            }
            // Failed scenarios carry no assessment.
            if let Err(e) = self.store.delete_assessment(id) {
                tracing::warn!(error = %e, "could not discard stale risk assessment");
            }
        }
    }

    /// Run several distinct scenarios in parallel; results follow `ids` order.
    pub fn run_scenarios(&self, ids: &[ScenarioId]) -> Vec<Result<ScenarioResult, ScenarioError>> {
        ids.par_iter().map(|id| self.run_scenario(id)).collect()
    }

    /// Direct access to the price-path models.
    pub fn run_market_simulation(&self, model: &SimulationModel) -> Result<Vec<f64>, ScenarioError> {
        let stream = match model {
            SimulationModel::Gbm { .. } => "gbm",
            SimulationModel::JumpDiffusion { .. } => "jump_diffusion",
        };
        let mut rng = self.rng_for("market_simulation", stream);
        Ok(model.simulate(&mut rng)?)
    }

    /// Direct access to the hourly multi-asset walker.
    pub fn simulate_conditions(
        &self,
        initial: &[MarketCondition],
        duration_days: u32,
    ) -> Result<Vec<MarketCondition>, ScenarioError> {
        let mut rng = self.rng_for("market_simulation", "conditions");
        Ok(simulate_market_conditions(
            initial,
            duration_days,
            &self.config.simulation,
            &mut rng,
        )?)
    }

    /// Apply one stress scenario on behalf of an existing scenario.
    pub fn run_stress_test(
        &self,
        id: &ScenarioId,
        stress: &StressTestScenario,
    ) -> Result<StressTestResult, ScenarioError> {
        self.get_scenario(id)?;
        let mut rng = self.rng_for(id.as_str(), &stress.name);
        Ok(self.stress.run(id, stress, &mut rng)?)
    }

    /// Apply many stress scenarios in parallel.
    pub fn run_stress_suite(
        &self,
        id: &ScenarioId,
        stresses: &[StressTestScenario],
    ) -> Result<Vec<StressTestResult>, ScenarioError> {
        self.get_scenario(id)?;
        let seeds = self.seeds.clone().unwrap_or_else(SeedHierarchy::from_entropy);
        Ok(self.stress.run_suite(id, stresses, &seeds)?)
    }

    /// Latest risk-assessment snapshot of a scenario.
    pub fn get_risk_assessment(&self, id: &ScenarioId) -> Result<RiskAssessment, ScenarioError> {
        self.get_scenario(id)?;
        self.store
            .load_assessment(id)?
            .ok_or_else(|| ScenarioError::NotAssessed(id.clone()))
    }
}
