//! Break-even premium search
//!
//! Finds the annual premium at which the simulated mean NPV is approximately zero.

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::simulation::MonteCarloEvaluator;

/// One mean-NPV evaluation made during a search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverStep {
    pub iteration: u32,
    pub premium: f64,
    pub mean_npv: f64,
    /// Set on the evaluation that ended the search; no premium move follows it
    pub stopping: bool,
}

/// Result of a break-even search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOutcome {
    /// Last premium tried, rounded to cents
    pub premium: f64,
    /// Whether |mean NPV| met the tolerance; false means the iteration cap ended the search
    pub converged: bool,
    /// Premium adjustments made before stopping
    pub iterations: u32,
    /// Mean NPV at the returned premium (before rounding)
    pub final_mean_npv: f64,
}

/// Callback receiving every evaluation in order
pub trait SolverObserver {
    fn on_step(&mut self, step: &SolverStep);
}

impl<F: FnMut(&SolverStep)> SolverObserver for F {
    fn on_step(&mut self, step: &SolverStep) {
        self(step)
    }
}

/// Observer that ignores every step
pub struct Silent;

impl SolverObserver for Silent {
    fn on_step(&mut self, _step: &SolverStep) {}
}

/// Root-finding strategy over the Monte Carlo mean NPV
pub trait BreakEvenSolver {
    fn solve(
        &self,
        evaluator: &MonteCarloEvaluator,
        rng: &mut dyn RngCore,
        observer: &mut dyn SolverObserver,
    ) -> SolverOutcome;
}

/// Round to cents
pub fn round_premium(premium: f64) -> f64 {
    round_to(premium, 2)
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Sign-following search with a constant step
///
/// Moves the premium down by `step` while mean NPV is positive and up while
/// negative. The step never shrinks, so the search can oscillate around the
/// root and stop on the iteration cap instead of the tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FixedStepSearch {
    pub initial_premium: f64,
    pub step: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for FixedStepSearch {
    fn default() -> Self {
        Self {
            initial_premium: 2000.0,
            step: 100.0,
            tolerance: 1e-2,
            max_iterations: 200,
        }
    }
}

impl BreakEvenSolver for FixedStepSearch {
    fn solve(
        &self,
        evaluator: &MonteCarloEvaluator,
        rng: &mut dyn RngCore,
        observer: &mut dyn SolverObserver,
    ) -> SolverOutcome {
        let mut premium = self.initial_premium;
        let mut iteration = 0u32;

        loop {
            let mean_npv = evaluate(evaluator, rng, iteration, premium);

            let converged = mean_npv.abs() <= self.tolerance;
            let stopping = converged || iteration >= self.max_iterations;
            observer.on_step(&SolverStep { iteration, premium, mean_npv, stopping });
            if stopping {
                return SolverOutcome {
                    premium: round_premium(premium),
                    converged,
                    iterations: iteration,
                    final_mean_npv: mean_npv,
                };
            }

            if mean_npv > 0.0 {
                premium -= self.step;
            } else {
                premium += self.step;
            }
            iteration += 1;
        }
    }
}

/// Interval halving between two premiums
///
/// Relies on mean NPV increasing with premium. Each evaluation draws a fresh
/// cohort, so the bracket is only as reliable as the sample size allows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BisectionSearch {
    pub lower: f64,
    pub upper: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for BisectionSearch {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 10_000.0,
            tolerance: 1e-2,
            max_iterations: 200,
        }
    }
}

impl BreakEvenSolver for BisectionSearch {
    fn solve(
        &self,
        evaluator: &MonteCarloEvaluator,
        rng: &mut dyn RngCore,
        observer: &mut dyn SolverObserver,
    ) -> SolverOutcome {
        let mut low = self.lower.min(self.upper);
        let mut high = self.lower.max(self.upper);

        let npv_low = evaluate(evaluator, rng, 0, low);
        let npv_high = evaluate(evaluator, rng, 0, high);
        let bracketed = npv_low <= 0.0 && npv_high >= 0.0;
        let settled = npv_low.abs() <= self.tolerance || npv_high.abs() <= self.tolerance || !bracketed;
        observer.on_step(&SolverStep { iteration: 0, premium: low, mean_npv: npv_low, stopping: false });
        observer.on_step(&SolverStep { iteration: 0, premium: high, mean_npv: npv_high, stopping: settled });

        let finish = |premium: f64, mean_npv: f64, converged: bool, iterations: u32| SolverOutcome {
            premium: round_premium(premium),
            converged,
            iterations,
            final_mean_npv: mean_npv,
        };

        if npv_low.abs() <= self.tolerance {
            return finish(low, npv_low, true, 0);
        }
        if npv_high.abs() <= self.tolerance {
            return finish(high, npv_high, true, 0);
        }
        if !bracketed {
            log::warn!(
                "break-even premium not bracketed by [{:.2}, {:.2}] (mean NPV {:.2} / {:.2})",
                low, high, npv_low, npv_high
            );
            return if npv_low.abs() < npv_high.abs() {
                finish(low, npv_low, false, 0)
            } else {
                finish(high, npv_high, false, 0)
            };
        }

        let mut iteration = 1u32;
        loop {
            let mid = 0.5 * (low + high);
            let npv_mid = evaluate(evaluator, rng, iteration, mid);

            // Further halving cannot move the rounded premium
            let converged = npv_mid.abs() <= self.tolerance || (high - low) < 0.005;
            let stopping = converged || iteration >= self.max_iterations;
            observer.on_step(&SolverStep { iteration, premium: mid, mean_npv: npv_mid, stopping });
            if stopping {
                return finish(mid, npv_mid, converged, iteration);
            }

            if npv_mid > 0.0 {
                high = mid;
            } else {
                low = mid;
            }
            iteration += 1;
        }
    }
}

fn evaluate(evaluator: &MonteCarloEvaluator, rng: &mut dyn RngCore, iteration: u32, premium: f64) -> f64 {
    let mean_npv = evaluator.mean_npv(premium, rng);
    log::debug!("iteration {}: premium={:.2} mean_npv={:.4}", iteration, premium, mean_npv);
    mean_npv
}

/// Configured root-finding strategy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SolverMethod {
    FixedStep(FixedStepSearch),
    Bisection(BisectionSearch),
}

impl SolverMethod {
    pub fn solver(&self) -> &dyn BreakEvenSolver {
        match self {
            SolverMethod::FixedStep(s) => s,
            SolverMethod::Bisection(s) => s,
        }
    }
}

impl Default for SolverMethod {
    fn default() -> Self {
        SolverMethod::FixedStep(FixedStepSearch::default())
    }
}

impl BreakEvenSolver for SolverMethod {
    fn solve(
        &self,
        evaluator: &MonteCarloEvaluator,
        rng: &mut dyn RngCore,
        observer: &mut dyn SolverObserver,
    ) -> SolverOutcome {
        self.solver().solve(evaluator, rng, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assumptions::{DistributionSpec, SeverityDistribution, SimulationParameters};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Deterministic cohort: NPV = 6 * premium - 60000, root at 10000
    fn deterministic_evaluator() -> MonteCarloEvaluator {
        let params = SimulationParameters {
            discount_rate: 0.0,
            severity: SeverityDistribution::single(2),
            lifetime: DistributionSpec::Constant { value: 70.0 },
            dependency_onset: DistributionSpec::Constant { value: 65.0 },
            dependency_duration: DistributionSpec::Constant { value: 10.0 },
            ..SimulationParameters::default_pricing()
        };
        MonteCarloEvaluator::new(&params, 5).unwrap()
    }

    #[test]
    fn test_zero_iterations_returns_initial_premium() {
        let evaluator = MonteCarloEvaluator::new(&SimulationParameters::default_pricing(), 100).unwrap();
        let search = FixedStepSearch {
            initial_premium: 2000.0,
            step: 100.0,
            tolerance: 1e-2,
            max_iterations: 0,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = search.solve(&evaluator, &mut rng, &mut Silent);

        assert_eq!(outcome.premium, 2000.0);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_fixed_step_converges_on_exact_root() {
        let evaluator = deterministic_evaluator();
        let search = FixedStepSearch {
            initial_premium: 9000.0,
            step: 100.0,
            tolerance: 1e-2,
            max_iterations: 200,
        };
        let mut steps = Vec::new();
        let mut record = |s: &SolverStep| steps.push(*s);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = search.solve(&evaluator, &mut rng, &mut record);

        assert!(outcome.converged);
        assert_eq!(outcome.premium, 10_000.0);
        assert_eq!(outcome.iterations, 10);
        assert_eq!(steps.len(), 11);
        assert_eq!(steps[0].mean_npv, -6000.0);
        // Only the evaluation at the root ends the search
        assert!(steps[..10].iter().all(|s| !s.stopping));
        assert!(steps[10].stopping);
        assert_eq!(steps[10].premium, 10_000.0);
    }

    #[test]
    fn test_fixed_step_oscillation_stops_on_cap() {
        let evaluator = deterministic_evaluator();
        // Root at 10000 is never landed on from 9950 with a step of 100
        let search = FixedStepSearch {
            initial_premium: 9950.0,
            step: 100.0,
            tolerance: 1e-2,
            max_iterations: 20,
        };
        let mut count = 0;
        let mut counter = |_: &SolverStep| count += 1;
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = search.solve(&evaluator, &mut rng, &mut counter);

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 20);
        assert_eq!(count, 21);
        assert!(outcome.premium == 9950.0 || outcome.premium == 10_050.0);
    }

    #[test]
    fn test_bisection_finds_root() {
        let evaluator = deterministic_evaluator();
        let search = BisectionSearch {
            lower: 0.0,
            upper: 16_000.0,
            tolerance: 1e-2,
            max_iterations: 100,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = search.solve(&evaluator, &mut rng, &mut Silent);

        assert!(outcome.converged);
        assert!((outcome.premium - 10_000.0).abs() < 0.01, "premium {}", outcome.premium);
    }

    #[test]
    fn test_bisection_reports_unbracketed_root() {
        let evaluator = deterministic_evaluator();
        let search = BisectionSearch {
            lower: 0.0,
            upper: 5_000.0,
            tolerance: 1e-2,
            max_iterations: 100,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = search.solve(&evaluator, &mut rng, &mut Silent);

        assert!(!outcome.converged);
        assert_eq!(outcome.premium, 5_000.0);
    }

    #[test]
    fn test_solver_method_dispatch() {
        let evaluator = deterministic_evaluator();
        let method = SolverMethod::FixedStep(FixedStepSearch {
            initial_premium: 10_000.0,
            ..FixedStepSearch::default()
        });
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let outcome = method.solve(&evaluator, &mut rng, &mut Silent);
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 0);
    }

    #[test]
    fn test_round_premium() {
        assert_eq!(round_premium(1234.5678), 1234.57);
        assert_eq!(round_premium(-0.004), -0.0);
    }
}
