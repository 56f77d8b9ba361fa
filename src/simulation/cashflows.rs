//! Discounted premium and claim cashflows for one policyholder

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::sampler::{PolicyholderDraw, PolicySampler};
use crate::assumptions::{PremiumTiming, SimulationParameters};

/// Present values for one policyholder under one premium
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolicyCashflows {
    /// Years of dependency that fall before death
    pub claim_years: f64,
    /// Number of annual premiums collected
    pub premium_years: u32,
    pub pv_premiums: f64,
    pub pv_claims: f64,
}

impl PolicyCashflows {
    /// Net present value to the insurer
    pub fn npv(&self) -> f64 {
        self.pv_premiums - self.pv_claims
    }
}

impl PolicyholderDraw {
    /// Project premiums and claims for this policyholder
    pub fn cashflows(&self, premium: f64, params: &SimulationParameters) -> PolicyCashflows {
        let (claim_years, pv_claims) = self.discounted_claims(params);
        let (premium_years, pv_premiums) = self.discounted_premiums(premium, params);

        PolicyCashflows {
            claim_years,
            premium_years,
            pv_premiums,
            pv_claims,
        }
    }

    /// One annual benefit per complete year of dependency, paid at years 1..=n
    fn discounted_claims(&self, params: &SimulationParameters) -> (f64, f64) {
        // Dependency that starts after death never produces a claim
        if self.dependency_onset_age > self.age_at_death {
            return (0.0, 0.0);
        }

        let claim_years = self
            .dependency_duration_years
            .min(self.age_at_death - self.dependency_onset_age);
        let annual_benefit = self.monthly_benefit * 12.0;
        let full_years = claim_years.trunc() as i64;

        let pv = (1..=full_years)
            .map(|t| params.discount(annual_benefit, t as f64))
            .sum();

        (claim_years, pv)
    }

    /// Annual premiums from entry age through min(death, cease age)
    fn discounted_premiums(&self, premium: f64, params: &SimulationParameters) -> (u32, f64) {
        let first_age = params.entry_age as i64;
        let last_age = self.age_at_death.min(params.premium_cease_age as f64).trunc() as i64;

        // Entry at or beyond the cease age leaves the range empty
        if last_age < first_age {
            return (0, 0.0);
        }

        let pv = (first_age..=last_age)
            .map(|age| {
                let t = match params.premium_timing {
                    PremiumTiming::AttainedAge => age,
                    PremiumTiming::PolicyDuration => age - first_age,
                };
                params.discount(premium, t as f64)
            })
            .sum();

        ((last_age - first_age + 1) as u32, pv)
    }
}

/// Draw one policyholder and return its NPV at `premium`
pub fn evaluate_one_policy<R: Rng + ?Sized>(premium: f64, sampler: &PolicySampler, rng: &mut R) -> f64 {
    sampler.draw(rng).cashflows(premium, sampler.params()).npv()
}
