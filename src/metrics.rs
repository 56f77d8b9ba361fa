//! Risk metrics over a simulated NPV distribution

use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};
use crate::solver::round_to;

/// Percentile of the NPV distribution reported as VaR(95%)
pub const VAR_PERCENTILE: f64 = 5.0;

/// Summary statistics of an NPV sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Arithmetic mean
    pub mean: f64,
    /// Population standard deviation (divides by N)
    pub std_dev: f64,
    /// Fraction of outcomes strictly below zero
    pub prob_loss: f64,
    /// 5th percentile of NPV
    pub var_95: f64,
}

impl RiskMetrics {
    /// Compute metrics at full precision
    pub fn from_sample(sample: &[f64]) -> Result<Self> {
        if sample.is_empty() {
            return Err(PricingError::EmptySample);
        }

        let n = sample.len() as f64;
        let mean = sample.iter().sum::<f64>() / n;
        let variance = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let losses = sample.iter().filter(|&&v| v < 0.0).count();

        let mut sorted = sample.to_vec();
        sorted.sort_by(f64::total_cmp);

        Ok(Self {
            mean,
            std_dev: variance.max(0.0).sqrt(),
            prob_loss: losses as f64 / n,
            var_95: percentile(&sorted, VAR_PERCENTILE),
        })
    }

    /// Round for reporting: cents for money, 4 decimals for the loss probability
    pub fn rounded(&self) -> Self {
        Self {
            mean: round_to(self.mean, 2),
            std_dev: round_to(self.std_dev, 2),
            prob_loss: round_to(self.prob_loss, 4),
            var_95: round_to(self.var_95, 2),
        }
    }
}

/// Percentile of an ascending slice with linear interpolation between order statistics
///
/// Uses rank `p/100 * (n - 1)`, the same convention as numpy's default.
/// `sorted` must be non-empty.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}
