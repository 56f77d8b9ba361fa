//! Pricing engine: baseline break-even search, risk metrics, and sensitivity table

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::assumptions::SimulationParameters;
use crate::error::{PricingError, Result};
use crate::scenario::{default_scenarios, evaluate_scenario, run_sensitivity, ScenarioResult, ScenarioSpec, BASELINE_SCENARIO};
use crate::simulation::DEFAULT_SIMULATIONS;
use crate::solver::{Silent, SolverMethod, SolverObserver};

/// RNG stream reserved for the baseline run
const BASELINE_STREAM: u64 = 0;

/// Generator for one stream of a run; streams of the same seed are independent
pub fn scenario_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// Configuration for a pricing run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Policyholders simulated per evaluation; shared by every scenario
    pub simulations: usize,

    /// Break-even root finder
    pub solver: SolverMethod,

    /// Seed for reproducible runs; drawn from OS entropy when None
    pub seed: Option<u64>,

    /// Evaluate sensitivity scenarios on the rayon thread pool
    pub parallel_scenarios: bool,

    /// Scenarios for the sensitivity table, in reporting order
    pub scenarios: Vec<ScenarioSpec>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            solver: SolverMethod::default(),
            seed: None,
            parallel_scenarios: false,
            scenarios: default_scenarios(),
        }
    }
}

/// Complete pricing output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingReport {
    pub generated_at: DateTime<Utc>,

    /// Seed that reproduces this report
    pub seed: u64,

    pub simulations: usize,

    /// Baseline break-even premium and risk metrics
    pub baseline: ScenarioResult,

    /// Baseline row followed by one row per scenario
    pub sensitivity: Vec<ScenarioResult>,
}

impl PricingReport {
    /// Copy with all metrics rounded for presentation
    pub fn rounded(&self) -> Self {
        Self {
            baseline: self.baseline.rounded(),
            sensitivity: self.sensitivity.iter().map(ScenarioResult::rounded).collect(),
            ..self.clone()
        }
    }
}

/// Main pricing engine
pub struct PricingEngine {
    params: SimulationParameters,
    config: PricingConfig,
}

impl PricingEngine {
    /// Create an engine, rejecting invalid assumptions up front
    pub fn new(params: SimulationParameters, config: PricingConfig) -> Result<Self> {
        params.validate()?;
        if config.simulations == 0 {
            return Err(PricingError::InvalidParameter {
                name: "simulations",
                reason: "at least one policyholder must be simulated".to_string(),
            });
        }
        Ok(Self { params, config })
    }

    pub fn params(&self) -> &SimulationParameters {
        &self.params
    }

    pub fn config(&self) -> &PricingConfig {
        &self.config
    }

    /// Run baseline and sensitivity without progress reporting
    pub fn price(&self) -> Result<PricingReport> {
        self.price_with_observer(&mut Silent)
    }

    /// Run baseline and sensitivity; `observer` sees every baseline solver step
    pub fn price_with_observer(&self, observer: &mut dyn SolverObserver) -> Result<PricingReport> {
        let seed = self.config.seed.unwrap_or_else(rand::random::<u64>);
        log::info!(
            "Pricing with {} simulations per evaluation, seed {}",
            self.config.simulations, seed
        );

        let baseline = self.baseline(seed, observer)?;
        let sensitivity = run_sensitivity(
            &self.params,
            &self.config,
            &baseline,
            &self.config.scenarios,
            seed,
        )?;

        Ok(PricingReport {
            generated_at: Utc::now(),
            seed,
            simulations: self.config.simulations,
            baseline,
            sensitivity,
        })
    }

    /// Break-even premium and risk metrics under the unperturbed assumptions
    pub fn baseline(&self, seed: u64, observer: &mut dyn SolverObserver) -> Result<ScenarioResult> {
        let mut rng = scenario_rng(seed, BASELINE_STREAM);
        evaluate_scenario(
            BASELINE_SCENARIO,
            &self.params,
            self.config.simulations,
            &self.config.solver,
            &mut rng,
            observer,
        )
    }
}
