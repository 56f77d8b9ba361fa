//! LTC Pricing CLI
//!
//! Prices the dependency cover by Monte Carlo and prints the break-even
//! premium, risk metrics, and sensitivity table.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use ltc_pricing::{
    simulation::DEFAULT_SIMULATIONS,
    BisectionSearch, FixedStepSearch, PricingConfig, PricingEngine, PricingReport,
    ScenarioResult, SimulationParameters, SolverMethod, SolverStep,
};

#[derive(Parser, Debug)]
#[command(name = "ltc_pricing", version, about = "Monte Carlo break-even pricing for LTC dependency cover")]
struct Cli {
    /// Assumptions directory containing parameters.json and/or claim_costs.csv
    #[arg(long, env = "LTC_ASSUMPTIONS")]
    assumptions: Option<PathBuf>,

    /// Parameters JSON file (alternative to --assumptions)
    #[arg(long, env = "LTC_PARAMS", conflicts_with = "assumptions")]
    params: Option<PathBuf>,

    /// Policyholders simulated per evaluation
    #[arg(long, env = "LTC_SIMULATIONS", default_value_t = DEFAULT_SIMULATIONS)]
    simulations: usize,

    /// Random seed; omitted means a fresh seed each run
    #[arg(long, env = "LTC_SEED")]
    seed: Option<u64>,

    #[arg(long, default_value_t = 2000.0)]
    initial_premium: f64,

    #[arg(long, default_value_t = 100.0)]
    step: f64,

    #[arg(long, default_value_t = 1e-2)]
    tolerance: f64,

    #[arg(long, default_value_t = 200)]
    max_iterations: u32,

    /// Bisect between --lower and --upper instead of the fixed-step search
    #[arg(long)]
    bisection: bool,

    #[arg(long, default_value_t = 0.0)]
    lower: f64,

    #[arg(long, default_value_t = 10_000.0)]
    upper: f64,

    /// Run sensitivity scenarios in parallel
    #[arg(long)]
    parallel: bool,

    /// Print the report as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Write the sensitivity table to this CSV file
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn solver(&self) -> SolverMethod {
        if self.bisection {
            SolverMethod::Bisection(BisectionSearch {
                lower: self.lower,
                upper: self.upper,
                tolerance: self.tolerance,
                max_iterations: self.max_iterations,
            })
        } else {
            SolverMethod::FixedStep(FixedStepSearch {
                initial_premium: self.initial_premium,
                step: self.step,
                tolerance: self.tolerance,
                max_iterations: self.max_iterations,
            })
        }
    }

    fn parameters(&self) -> Result<SimulationParameters> {
        if let Some(dir) = &self.assumptions {
            SimulationParameters::from_assumptions_dir(dir)
                .with_context(|| format!("loading assumptions from {}", dir.display()))
        } else if let Some(file) = &self.params {
            SimulationParameters::from_json_file(file)
                .with_context(|| format!("loading parameters from {}", file.display()))
        } else {
            Ok(SimulationParameters::default_pricing())
        }
    }
}

/// Sensitivity table row as written to CSV
#[derive(Serialize)]
struct CsvRow<'a> {
    #[serde(rename = "Scenario")]
    scenario: &'a str,
    #[serde(rename = "Break-Even Premium")]
    break_even_premium: f64,
    #[serde(rename = "Mean NPV")]
    mean_npv: f64,
    #[serde(rename = "Std NPV")]
    std_npv: f64,
    #[serde(rename = "Prob(NPV < 0)")]
    prob_loss: f64,
    #[serde(rename = "VaR (95%)")]
    var_95: f64,
    #[serde(rename = "Converged")]
    converged: bool,
}

impl<'a> From<&'a ScenarioResult> for CsvRow<'a> {
    fn from(row: &'a ScenarioResult) -> Self {
        Self {
            scenario: &row.scenario,
            break_even_premium: row.break_even_premium,
            mean_npv: row.metrics.mean,
            std_npv: row.metrics.std_dev,
            prob_loss: row.metrics.prob_loss,
            var_95: row.metrics.var_95,
            converged: row.converged,
        }
    }
}

fn write_csv(path: &Path, rows: &[ScenarioResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for row in rows {
        writer.serialize(CsvRow::from(row))?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(report: &PricingReport) {
    let b = &report.baseline;
    println!("\nRisk Metrics Summary:");
    println!("{:>20} {:>14} {:>14} {:>14} {:>14}",
        "Break-Even Premium", "Mean NPV", "Std NPV", "Prob(NPV < 0)", "VaR (95%)");
    println!("{:>20.2} {:>14.2} {:>14.2} {:>14.4} {:>14.2}",
        b.break_even_premium, b.metrics.mean, b.metrics.std_dev, b.metrics.prob_loss, b.metrics.var_95);
}

fn print_sensitivity(report: &PricingReport) {
    println!("\nSensitivity Analysis:");
    println!("{:<16} {:>20} {:>14} {:>14} {:>14} {:>14}",
        "Scenario", "Break-Even Premium", "Mean NPV", "Std NPV", "Prob(NPV < 0)", "VaR (95%)");
    println!("{}", "-".repeat(97));
    for row in &report.sensitivity {
        println!("{:<16} {:>20.2} {:>14.2} {:>14.2} {:>14.4} {:>14.2}{}",
            row.scenario,
            row.break_even_premium,
            row.metrics.mean,
            row.metrics.std_dev,
            row.metrics.prob_loss,
            row.metrics.var_95,
            if row.converged { "" } else { "  *" },
        );
    }
    if report.sensitivity.iter().any(|r| !r.converged) {
        println!("* solver stopped on the iteration cap before reaching tolerance");
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let params = cli.parameters()?;
    let config = PricingConfig {
        simulations: cli.simulations,
        solver: cli.solver(),
        seed: cli.seed,
        parallel_scenarios: cli.parallel,
        ..PricingConfig::default()
    };

    let engine = PricingEngine::new(params, config).context("invalid pricing configuration")?;

    let report = if cli.json {
        engine.price()?
    } else {
        // One line per premium move; the evaluation that ends the search is not echoed
        let mut progress = |step: &SolverStep| {
            if !step.stopping {
                println!("${}", step.mean_npv);
            }
        };
        engine.price_with_observer(&mut progress)?
    };
    let report = report.rounded();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Break-even premium: $ {:.2}", report.baseline.break_even_premium);
        print_summary(&report);
        print_sensitivity(&report);
        println!("\nSeed: {} ({} simulations per evaluation)", report.seed, report.simulations);
    }

    if let Some(path) = &cli.output {
        write_csv(path, &report.sensitivity)?;
        if !cli.json {
            println!("Sensitivity table written to: {}", path.display());
        }
    }

    Ok(())
}
