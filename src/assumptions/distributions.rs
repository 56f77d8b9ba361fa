//! Parametric distributions for policyholder lifetime and dependency events

use rand::Rng;
use rand_distr::{Distribution, Normal, Weibull};
use serde::{Deserialize, Serialize};

use crate::error::{PricingError, Result};

/// Named distribution with its parameters, as stored in the assumption set
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DistributionSpec {
    /// Gaussian in years
    Normal { mean: f64, std_dev: f64 },
    /// Weibull with scale lambda and shape k: `lambda * (-ln U)^(1/k)`
    Weibull { shape: f64, scale: f64 },
    /// Degenerate distribution, always returns `value`
    Constant { value: f64 },
}

impl DistributionSpec {
    /// Age at death: Normal(85, 5)
    pub fn default_lifetime() -> Self {
        DistributionSpec::Normal { mean: 85.0, std_dev: 5.0 }
    }

    /// Age at dependency onset: Normal(75, 3)
    pub fn default_dependency_onset() -> Self {
        DistributionSpec::Normal { mean: 75.0, std_dev: 3.0 }
    }

    /// Dependency duration in years: standard Weibull(2) scaled by 3
    pub fn default_dependency_duration() -> Self {
        DistributionSpec::Weibull { shape: 2.0, scale: 3.0 }
    }

    /// Multiply every draw by `factor`
    ///
    /// For Weibull this rescales lambda, which is the same as scaling each draw.
    /// A zero factor collapses any distribution to a constant zero.
    pub fn scaled(&self, factor: f64) -> Self {
        if factor == 0.0 {
            return DistributionSpec::Constant { value: 0.0 };
        }
        match *self {
            DistributionSpec::Normal { mean, std_dev } => DistributionSpec::Normal {
                mean: mean * factor,
                std_dev: std_dev * factor.abs(),
            },
            DistributionSpec::Weibull { shape, scale } => DistributionSpec::Weibull {
                shape,
                scale: scale * factor,
            },
            DistributionSpec::Constant { value } => DistributionSpec::Constant {
                value: value * factor,
            },
        }
    }

    /// Validate parameters and build a sampler
    ///
    /// `name` identifies the assumption in error messages.
    pub fn build(&self, name: &'static str) -> Result<ContinuousSampler> {
        let invalid = |reason: String| PricingError::InvalidDistribution { name, reason };

        match *self {
            DistributionSpec::Normal { mean, std_dev } => {
                if !mean.is_finite() {
                    return Err(invalid(format!("mean must be finite, got {}", mean)));
                }
                if !std_dev.is_finite() || std_dev < 0.0 {
                    return Err(invalid(format!(
                        "standard deviation must be finite and non-negative, got {}",
                        std_dev
                    )));
                }
                Normal::new(mean, std_dev)
                    .map(ContinuousSampler::Normal)
                    .map_err(|e| invalid(e.to_string()))
            }
            DistributionSpec::Weibull { shape, scale } => {
                if !shape.is_finite() || !scale.is_finite() {
                    return Err(invalid(format!(
                        "shape and scale must be finite, got shape={} scale={}",
                        shape, scale
                    )));
                }
                if shape <= 0.0 || scale < 0.0 {
                    return Err(invalid(format!(
                        "shape must be positive and scale non-negative, got shape={} scale={}",
                        shape, scale
                    )));
                }
                // Zero scale puts all mass at zero
                if scale == 0.0 {
                    return Ok(ContinuousSampler::Constant(0.0));
                }
                Weibull::new(scale, shape)
                    .map(ContinuousSampler::Weibull)
                    .map_err(|e| invalid(e.to_string()))
            }
            DistributionSpec::Constant { value } => {
                if !value.is_finite() {
                    return Err(invalid(format!("constant must be finite, got {}", value)));
                }
                Ok(ContinuousSampler::Constant(value))
            }
        }
    }
}

/// Validated sampler built from a `DistributionSpec`
#[derive(Debug, Clone, Copy)]
pub enum ContinuousSampler {
    Normal(Normal<f64>),
    Weibull(Weibull<f64>),
    Constant(f64),
}

impl Distribution<f64> for ContinuousSampler {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            ContinuousSampler::Normal(d) => d.sample(rng),
            ContinuousSampler::Weibull(d) => d.sample(rng),
            ContinuousSampler::Constant(value) => *value,
        }
    }
}
