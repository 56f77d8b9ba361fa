//! Pricing assumptions: policyholder distributions, claim costs, and discounting

mod claims;
mod distributions;
pub mod loader;

pub use claims::{ClaimCostTable, SeverityDistribution, SeverityTier};
pub use distributions::{ContinuousSampler, DistributionSpec};

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Time basis used as the discount exponent for premium payments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PremiumTiming {
    /// Discount each premium by the policyholder's attained age in years.
    /// This is the reference pricing basis; every published figure uses it.
    #[default]
    AttainedAge,
    /// Discount each premium by years elapsed since entry (age - entry_age)
    PolicyDuration,
}

/// Container for all simulation assumptions
///
/// Values are never mutated during a run. Sensitivity scenarios derive a new
/// instance through `ScenarioSpec::apply`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParameters {
    /// Age at policy inception
    pub entry_age: u32,

    /// Modelled horizon; informational only
    pub max_age: u32,

    /// Last age at which an annual premium is collected
    pub premium_cease_age: u32,

    /// Effective monthly discount rate
    pub discount_rate: f64,

    pub premium_timing: PremiumTiming,

    pub claim_costs: ClaimCostTable,
    pub severity: SeverityDistribution,

    pub lifetime: DistributionSpec,
    pub dependency_onset: DistributionSpec,
    pub dependency_duration: DistributionSpec,
}

impl SimulationParameters {
    /// Reference pricing basis
    pub fn default_pricing() -> Self {
        Self {
            entry_age: 60,
            max_age: 100,
            premium_cease_age: 65,
            discount_rate: 0.002,
            premium_timing: PremiumTiming::AttainedAge,
            claim_costs: ClaimCostTable::default_table(),
            severity: SeverityDistribution::default_mix(),
            lifetime: DistributionSpec::default_lifetime(),
            dependency_onset: DistributionSpec::default_dependency_onset(),
            dependency_duration: DistributionSpec::default_dependency_duration(),
        }
    }

    /// Load parameters from a JSON file; missing fields take reference values
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let params = loader::load_parameters_json(path)?;
        params.validate()?;
        Ok(params)
    }

    /// Load from the assumptions directory: `parameters.json` (optional) and
    /// `claim_costs.csv` (optional, overrides the tier benefits and severity mix;
    /// the fallback benefit for unlisted tiers still comes from `parameters.json`)
    pub fn from_assumptions_dir(path: &Path) -> Result<Self> {
        let loaded = loader::LoadedAssumptions::load_from(path)?;
        let mut params = loaded.parameters.unwrap_or_else(Self::default_pricing);
        if let Some((claim_costs, severity)) = loaded.claim_table {
            params.claim_costs = claim_costs.with_default_benefit(params.claim_costs.default_benefit());
            params.severity = severity;
        }
        params.validate()?;
        Ok(params)
    }

    /// Discount `amount` paid `t` years from now at the monthly rate
    pub fn discount(&self, amount: f64, t: f64) -> f64 {
        amount / (1.0 + self.discount_rate).powf(12.0 * t)
    }

    /// Check every invariant the samplers and the cashflow model rely on
    pub fn validate(&self) -> Result<()> {
        if !self.discount_rate.is_finite() || self.discount_rate <= -1.0 {
            return Err(PricingError::InvalidParameter {
                name: "discount_rate",
                reason: format!("monthly rate must be finite and greater than -1, got {}", self.discount_rate),
            });
        }

        self.claim_costs.validate()?;
        self.severity.validate()?;
        self.lifetime.build("lifetime")?;
        self.dependency_onset.build("dependency_onset")?;
        self.dependency_duration.build("dependency_duration")?;
        Ok(())
    }
}

impl Default for SimulationParameters {
    fn default() -> Self {
        Self::default_pricing()
    }
}
