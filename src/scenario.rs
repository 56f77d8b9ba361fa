//! Sensitivity scenarios
//!
//! Each scenario derives its own parameter set from the baseline, re-solves
//! the break-even premium, and re-measures risk at that premium. The baseline
//! parameters are borrowed immutably throughout, so no scenario can leak an
//! override into another or back into the caller.

use rand::RngCore;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::assumptions::SimulationParameters;
use crate::engine::{scenario_rng, PricingConfig};
use crate::error::{PricingError, Result};
use crate::metrics::RiskMetrics;
use crate::simulation::MonteCarloEvaluator;
use crate::solver::{BreakEvenSolver, SolverMethod, SolverObserver};

/// Name of the unperturbed row in every sensitivity table
pub const BASELINE_SCENARIO: &str = "Baseline";

/// Perturbation applied to the baseline assumptions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub name: String,
    /// Multiplier on every monthly benefit amount
    pub cost_multiplier: f64,
    /// Multiplier on every dependency duration draw
    pub duration_multiplier: f64,
    /// Annual discount rate shift in basis points
    pub discount_rate_shift_annual_bp: i32,
}

impl ScenarioSpec {
    pub fn new(
        name: impl Into<String>,
        cost_multiplier: f64,
        duration_multiplier: f64,
        discount_rate_shift_annual_bp: i32,
    ) -> Self {
        Self {
            name: name.into(),
            cost_multiplier,
            duration_multiplier,
            discount_rate_shift_annual_bp,
        }
    }

    /// Shift applied to the monthly discount rate
    pub fn monthly_rate_shift(&self) -> f64 {
        (self.discount_rate_shift_annual_bp as f64 / 10_000.0) / 12.0
    }

    /// Derive the scenario's parameter set; `base` is left untouched
    pub fn apply(&self, base: &SimulationParameters) -> Result<SimulationParameters> {
        if !self.cost_multiplier.is_finite() || self.cost_multiplier < 0.0 {
            return Err(PricingError::InvalidParameter {
                name: "cost_multiplier",
                reason: format!("scenario '{}' has multiplier {}", self.name, self.cost_multiplier),
            });
        }
        if !self.duration_multiplier.is_finite() || self.duration_multiplier < 0.0 {
            return Err(PricingError::InvalidParameter {
                name: "duration_multiplier",
                reason: format!("scenario '{}' has multiplier {}", self.name, self.duration_multiplier),
            });
        }

        let params = SimulationParameters {
            discount_rate: base.discount_rate + self.monthly_rate_shift(),
            claim_costs: base.claim_costs.scaled(self.cost_multiplier),
            dependency_duration: base.dependency_duration.scaled(self.duration_multiplier),
            ..base.clone()
        };
        params.validate()?;
        Ok(params)
    }
}

/// Standard sensitivity set: cost and duration +/-10%, discount rate +/-50 bp
pub fn default_scenarios() -> Vec<ScenarioSpec> {
    vec![
        ScenarioSpec::new("Cost +10%", 1.10, 1.00, 0),
        ScenarioSpec::new("Cost -10%", 0.90, 1.00, 0),
        ScenarioSpec::new("Duration +10%", 1.00, 1.10, 0),
        ScenarioSpec::new("Duration -10%", 1.00, 0.90, 0),
        ScenarioSpec::new("Discount +50 bp", 1.00, 1.00, 50),
        ScenarioSpec::new("Discount -50 bp", 1.00, 1.00, -50),
    ]
}

/// One row of the sensitivity table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario: String,
    pub break_even_premium: f64,
    /// Whether the solver met its tolerance
    pub converged: bool,
    pub iterations: u32,
    pub metrics: RiskMetrics,
}

impl ScenarioResult {
    /// Copy with metrics rounded for reporting
    pub fn rounded(&self) -> Self {
        Self {
            metrics: self.metrics.rounded(),
            ..self.clone()
        }
    }

    /// Same figures under another name
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        Self {
            scenario: name.into(),
            ..self.clone()
        }
    }
}

/// Solve the break-even premium, then measure risk on a fresh cohort at that premium
pub fn evaluate_scenario(
    name: &str,
    params: &SimulationParameters,
    simulations: usize,
    solver: &SolverMethod,
    rng: &mut dyn RngCore,
    observer: &mut dyn SolverObserver,
) -> Result<ScenarioResult> {
    let evaluator = MonteCarloEvaluator::new(params, simulations)?;
    let outcome = solver.solve(&evaluator, rng, observer);

    if !outcome.converged {
        log::warn!(
            "{}: solver stopped after {} iterations at premium {:.2} (mean NPV {:.4})",
            name, outcome.iterations, outcome.premium, outcome.final_mean_npv
        );
    }

    let sample = evaluator.sample_npv(outcome.premium, rng);
    let metrics = RiskMetrics::from_sample(&sample)?;

    log::info!(
        "{}: break-even premium {:.2}, mean NPV {:.2}, P(loss) {:.4}",
        name, outcome.premium, metrics.mean, metrics.prob_loss
    );

    Ok(ScenarioResult {
        scenario: name.to_string(),
        break_even_premium: outcome.premium,
        converged: outcome.converged,
        iterations: outcome.iterations,
        metrics,
    })
}

/// Build the sensitivity table
///
/// Row 0 is `baseline` as supplied, renamed to "Baseline"; it is not
/// recomputed. Scenario rows follow in the order given. Scenario `i` draws
/// from RNG stream `i + 1` of `seed`, so the table is identical whether the
/// scenarios run sequentially or in parallel.
pub fn run_sensitivity(
    params: &SimulationParameters,
    config: &PricingConfig,
    baseline: &ScenarioResult,
    scenarios: &[ScenarioSpec],
    seed: u64,
) -> Result<Vec<ScenarioResult>> {
    let run_one = |index: usize, spec: &ScenarioSpec| -> Result<ScenarioResult> {
        log::info!("Running scenario '{}'", spec.name);
        let scenario_params = spec.apply(params)?;
        let mut rng = scenario_rng(seed, index as u64 + 1);
        evaluate_scenario(
            &spec.name,
            &scenario_params,
            config.simulations,
            &config.solver,
            &mut rng,
            &mut crate::solver::Silent,
        )
    };

    let rows: Vec<ScenarioResult> = if config.parallel_scenarios {
        scenarios
            .par_iter()
            .enumerate()
            .map(|(i, spec)| run_one(i, spec))
            .collect::<Result<_>>()?
    } else {
        scenarios
            .iter()
            .enumerate()
            .map(|(i, spec)| run_one(i, spec))
            .collect::<Result<_>>()?
    };

    let mut table = Vec::with_capacity(rows.len() + 1);
    table.push(baseline.renamed(BASELINE_SCENARIO));
    table.extend(rows);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::DistributionSpec;

    fn quick_config(parallel: bool) -> PricingConfig {
        PricingConfig {
            simulations: 50,
            solver: SolverMethod::FixedStep(crate::solver::FixedStepSearch {
                max_iterations: 30,
                ..Default::default()
            }),
            seed: Some(2024),
            parallel_scenarios: parallel,
            ..PricingConfig::default()
        }
    }

    fn baseline_row() -> ScenarioResult {
        ScenarioResult {
            scenario: "whatever".to_string(),
            break_even_premium: 1234.0,
            converged: true,
            iterations: 7,
            metrics: RiskMetrics { mean: 1.0, std_dev: 2.0, prob_loss: 0.5, var_95: -3.0 },
        }
    }

    #[test]
    fn test_apply_scales_assumptions() {
        let base = SimulationParameters::default_pricing();
        let spec = ScenarioSpec::new("mixed", 1.1, 0.9, 50);
        let derived = spec.apply(&base).unwrap();

        assert!((derived.claim_costs.monthly_benefit(1) - 1650.0).abs() < 1e-9);
        assert!((derived.discount_rate - (0.002 + 0.005 / 12.0)).abs() < 1e-15);
        match derived.dependency_duration {
            DistributionSpec::Weibull { shape, scale } => {
                assert_eq!(shape, 2.0);
                assert!((scale - 2.7).abs() < 1e-12);
            }
            other => panic!("unexpected duration spec {:?}", other),
        }
        // Untouched fields carry over
        assert_eq!(derived.lifetime, base.lifetime);
        assert_eq!(derived.entry_age, base.entry_age);
    }

    #[test]
    fn test_default_scenarios() {
        let names: Vec<_> = default_scenarios().into_iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            [
                "Cost +10%",
                "Cost -10%",
                "Duration +10%",
                "Duration -10%",
                "Discount +50 bp",
                "Discount -50 bp"
            ]
        );
    }

    #[test]
    fn test_table_shape_and_order() {
        let params = SimulationParameters::default_pricing();
        let scenarios = default_scenarios();
        let table =
            run_sensitivity(&params, &quick_config(false), &baseline_row(), &scenarios, 7).unwrap();

        assert_eq!(table.len(), 1 + scenarios.len());
        assert_eq!(table[0].scenario, BASELINE_SCENARIO);
        // Baseline is passed through, not recomputed
        assert_eq!(table[0].break_even_premium, 1234.0);
        assert_eq!(table[0].metrics, baseline_row().metrics);
        for (row, spec) in table[1..].iter().zip(&scenarios) {
            assert_eq!(row.scenario, spec.name);
        }
    }

    #[test]
    fn test_empty_scenario_list() {
        let params = SimulationParameters::default_pricing();
        let table = run_sensitivity(&params, &quick_config(false), &baseline_row(), &[], 7).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].scenario, BASELINE_SCENARIO);
    }

    #[test]
    fn test_baseline_parameters_unchanged() {
        let params = SimulationParameters::default_pricing();
        let before = params.clone();
        run_sensitivity(&params, &quick_config(false), &baseline_row(), &default_scenarios(), 3).unwrap();
        assert_eq!(params, before);
    }

    #[test]
    fn test_baseline_parameters_unchanged_on_error() {
        let params = SimulationParameters::default_pricing();
        let before = params.clone();
        let scenarios = vec![
            ScenarioSpec::new("Cost +10%", 1.1, 1.0, 0),
            ScenarioSpec::new("Broken", -1.0, 1.0, 0),
        ];

        for parallel in [false, true] {
            let result = run_sensitivity(&params, &quick_config(parallel), &baseline_row(), &scenarios, 3);
            assert!(result.is_err());
            assert_eq!(params, before);
        }
    }

    #[test]
    fn test_zero_duration_scenario_keeps_table() {
        let params = SimulationParameters::default_pricing();
        let scenarios = vec![
            ScenarioSpec::new("Cost +10%", 1.1, 1.0, 0),
            ScenarioSpec::new("No dependency", 1.0, 0.0, 0),
        ];
        let derived = scenarios[1].apply(&params).unwrap();
        assert_eq!(derived.dependency_duration, DistributionSpec::Constant { value: 0.0 });

        let table = run_sensitivity(&params, &quick_config(false), &baseline_row(), &scenarios, 1).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table[2].scenario, "No dependency");
        // No claims are ever paid, so no policyholder can lose money
        assert_eq!(table[2].metrics.prob_loss, 0.0);
        assert!(table[2].metrics.var_95 >= 0.0);
    }

    #[test]
    fn test_negative_duration_multiplier_rejected() {
        let base = SimulationParameters::default_pricing();
        let spec = ScenarioSpec::new("Negative", 1.0, -0.5, 0);
        assert!(matches!(
            spec.apply(&base),
            Err(PricingError::InvalidParameter { name: "duration_multiplier", .. })
        ));
    }

    #[test]
    fn test_discount_shift_below_minus_one_rejected() {
        let base = SimulationParameters::default_pricing();
        let spec = ScenarioSpec::new("Crash", 1.0, 1.0, -130_000);
        assert!(spec.apply(&base).is_err());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let params = SimulationParameters::default_pricing();
        let scenarios = default_scenarios();
        let sequential =
            run_sensitivity(&params, &quick_config(false), &baseline_row(), &scenarios, 11).unwrap();
        let parallel =
            run_sensitivity(&params, &quick_config(true), &baseline_row(), &scenarios, 11).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_higher_cost_needs_higher_premium() {
        // Constant lifetimes make the premium/claim trade-off exact
        let params = SimulationParameters {
            discount_rate: 0.0,
            lifetime: DistributionSpec::Constant { value: 70.0 },
            dependency_onset: DistributionSpec::Constant { value: 65.0 },
            dependency_duration: DistributionSpec::Constant { value: 10.0 },
            severity: crate::assumptions::SeverityDistribution::single(2),
            ..SimulationParameters::default_pricing()
        };
        let scenarios = vec![ScenarioSpec::new("Cost +20%", 1.2, 1.0, 0)];
        let config = PricingConfig {
            simulations: 5,
            solver: SolverMethod::FixedStep(crate::solver::FixedStepSearch {
                initial_premium: 9000.0,
                ..Default::default()
            }),
            ..PricingConfig::default()
        };
        let table = run_sensitivity(&params, &config, &baseline_row(), &scenarios, 1).unwrap();

        // 6 premiums must fund 5 years of 1200/month
        assert!(table[1].converged);
        assert_eq!(table[1].break_even_premium, 12_000.0);
        assert_eq!(table[1].metrics.mean, 0.0);
        assert_eq!(table[1].metrics.prob_loss, 0.0);
    }
}
