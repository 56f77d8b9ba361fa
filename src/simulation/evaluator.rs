//! Monte Carlo evaluation of policyholder NPV

use rand::Rng;

use super::cashflows::evaluate_one_policy;
use super::sampler::PolicySampler;
use crate::assumptions::SimulationParameters;
use crate::error::{PricingError, Result};

/// Default number of simulated policyholders per evaluation
pub const DEFAULT_SIMULATIONS: usize = 100;

/// Draws a fixed-size cohort of independent policyholders per call
#[derive(Debug, Clone)]
pub struct MonteCarloEvaluator {
    sampler: PolicySampler,
    simulations: usize,
}

impl MonteCarloEvaluator {
    /// Create an evaluator over `simulations` policyholders per call
    pub fn new(params: &SimulationParameters, simulations: usize) -> Result<Self> {
        if simulations == 0 {
            return Err(PricingError::InvalidParameter {
                name: "simulations",
                reason: "at least one policyholder must be simulated".to_string(),
            });
        }
        Ok(Self {
            sampler: PolicySampler::new(params)?,
            simulations,
        })
    }

    pub fn simulations(&self) -> usize {
        self.simulations
    }

    pub fn params(&self) -> &SimulationParameters {
        self.sampler.params()
    }

    /// Mean NPV over a fresh cohort; individual draws are not retained
    pub fn mean_npv<R: Rng + ?Sized>(&self, premium: f64, rng: &mut R) -> f64 {
        let total: f64 = (0..self.simulations)
            .map(|_| evaluate_one_policy(premium, &self.sampler, rng))
            .sum();
        total / self.simulations as f64
    }

    /// Full NPV sample over a fresh cohort, in draw order
    pub fn sample_npv<R: Rng + ?Sized>(&self, premium: f64, rng: &mut R) -> Vec<f64> {
        (0..self.simulations)
            .map(|_| evaluate_one_policy(premium, &self.sampler, rng))
            .collect()
    }
}
