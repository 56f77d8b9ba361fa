//! Stochastic policyholder simulation and cashflow valuation

mod sampler;
mod cashflows;
mod evaluator;

pub use sampler::{PolicyholderDraw, PolicySampler};
pub use cashflows::{evaluate_one_policy, PolicyCashflows};
pub use evaluator::{MonteCarloEvaluator, DEFAULT_SIMULATIONS};
