//! Claim cost table and claim severity distribution

use std::collections::BTreeMap;

use rand::distributions::WeightedIndex;
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Tolerance on the sum of severity probabilities
const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;

/// Monthly benefit by claim severity tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimCostTable {
    /// Monthly benefit amount keyed by tier (1 = most severe)
    benefits: BTreeMap<u8, f64>,

    /// Benefit paid for a tier missing from the table
    default_benefit: f64,
}

impl ClaimCostTable {
    /// Build a table from (tier, monthly benefit) pairs
    pub fn new(benefits: impl IntoIterator<Item = (u8, f64)>, default_benefit: f64) -> Self {
        Self {
            benefits: benefits.into_iter().collect(),
            default_benefit,
        }
    }

    /// Reference table: tier 1 = 1500, 2 = 1000, 3 = 600, 4 = 400 per month
    pub fn default_table() -> Self {
        Self::new([(1, 1500.0), (2, 1000.0), (3, 600.0), (4, 400.0)], 1000.0)
    }

    /// Monthly benefit for a tier, falling back to the default benefit
    pub fn monthly_benefit(&self, tier: u8) -> f64 {
        self.benefits.get(&tier).copied().unwrap_or(self.default_benefit)
    }

    pub fn default_benefit(&self) -> f64 {
        self.default_benefit
    }

    /// Same tier amounts with another fallback benefit
    pub fn with_default_benefit(self, default_benefit: f64) -> Self {
        Self { default_benefit, ..self }
    }

    /// Table with every amount, the default included, multiplied by `multiplier`
    pub fn scaled(&self, multiplier: f64) -> Self {
        Self {
            benefits: self
                .benefits
                .iter()
                .map(|(&tier, &benefit)| (tier, benefit * multiplier))
                .collect(),
            default_benefit: self.default_benefit * multiplier,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let amounts = self.benefits.values().chain(std::iter::once(&self.default_benefit));
        for &amount in amounts {
            if !amount.is_finite() || amount < 0.0 {
                return Err(PricingError::InvalidParameter {
                    name: "claim_costs",
                    reason: format!("monthly benefit must be finite and non-negative, got {}", amount),
                });
            }
        }
        Ok(())
    }
}

impl Default for ClaimCostTable {
    fn default() -> Self {
        Self::default_table()
    }
}

/// Probability of a single severity tier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityTier {
    pub tier: u8,
    pub probability: f64,
}

/// Categorical distribution over claim severity tiers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeverityDistribution {
    pub tiers: Vec<SeverityTier>,
}

impl SeverityDistribution {
    pub fn new(tiers: impl IntoIterator<Item = (u8, f64)>) -> Self {
        Self {
            tiers: tiers
                .into_iter()
                .map(|(tier, probability)| SeverityTier { tier, probability })
                .collect(),
        }
    }

    /// Reference mix: 20% / 30% / 30% / 20% over tiers 1-4
    pub fn default_mix() -> Self {
        Self::new([(1, 0.2), (2, 0.3), (3, 0.3), (4, 0.2)])
    }

    /// Always draws `tier`
    pub fn single(tier: u8) -> Self {
        Self::new([(tier, 1.0)])
    }

    pub fn validate(&self) -> Result<()> {
        if self.tiers.is_empty() {
            return Err(PricingError::InvalidSeverity("no tiers defined".to_string()));
        }

        let mut total = 0.0;
        for t in &self.tiers {
            if !t.probability.is_finite() || t.probability < 0.0 {
                return Err(PricingError::InvalidSeverity(format!(
                    "tier {} has invalid probability {}",
                    t.tier, t.probability
                )));
            }
            total += t.probability;
        }

        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(PricingError::InvalidSeverity(format!(
                "probabilities sum to {}, expected 1",
                total
            )));
        }
        Ok(())
    }

    /// Validate and build a sampler over tier indices
    pub(crate) fn build(&self) -> Result<(Vec<u8>, WeightedIndex<f64>)> {
        self.validate()?;
        let labels = self.tiers.iter().map(|t| t.tier).collect();
        let index = WeightedIndex::new(self.tiers.iter().map(|t| t.probability))
            .map_err(|e| PricingError::InvalidSeverity(e.to_string()))?;
        Ok((labels, index))
    }
}

impl Default for SeverityDistribution {
    fn default() -> Self {
        Self::default_mix()
    }
}
