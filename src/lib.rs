//! LTC Pricing - Monte Carlo pricing engine for long-term-care dependency insurance
//!
//! This library provides:
//! - Stochastic policyholder simulation (lifetime, dependency onset/duration, claim severity)
//! - Discounted premium and claim cashflows per policyholder
//! - Break-even premium search over the simulated mean NPV
//! - Risk metrics (mean, standard deviation, probability of loss, VaR) on the NPV distribution
//! - Sensitivity analysis under claim cost, duration, and discount rate shocks

pub mod error;
pub mod assumptions;
pub mod simulation;
pub mod solver;
pub mod metrics;
pub mod scenario;
pub mod engine;

// Re-export commonly used types
pub use error::{PricingError, Result};
pub use assumptions::{SimulationParameters, ClaimCostTable, SeverityDistribution, DistributionSpec, PremiumTiming};
pub use simulation::{MonteCarloEvaluator, PolicyholderDraw, PolicyCashflows};
pub use solver::{BreakEvenSolver, FixedStepSearch, BisectionSearch, SolverMethod, SolverOutcome, SolverStep};
pub use metrics::RiskMetrics;
pub use scenario::{ScenarioSpec, ScenarioResult, run_sensitivity, default_scenarios};
pub use engine::{PricingEngine, PricingConfig, PricingReport};
