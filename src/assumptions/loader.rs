//! File-based assumption loader
//!
//! Loads pricing assumptions from data/assumptions/

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use super::{ClaimCostTable, SeverityDistribution, SimulationParameters};
use crate::error::{PricingError, Result};

/// Default path to assumptions directory
pub const DEFAULT_ASSUMPTIONS_PATH: &str = "data/assumptions";

const PARAMETERS_FILE: &str = "parameters.json";
const CLAIM_COSTS_FILE: &str = "claim_costs.csv";

/// Monthly benefit for a tier absent from claim_costs.csv when no parameters file sets one
const DEFAULT_TIER_BENEFIT: f64 = 1000.0;

/// Raw CSV row of claim_costs.csv
#[derive(Debug, Deserialize)]
struct ClaimCostRow {
    #[serde(rename = "Tier")]
    tier: u8,
    #[serde(rename = "MonthlyBenefit")]
    monthly_benefit: f64,
    #[serde(rename = "Probability")]
    probability: f64,
}

/// Load simulation parameters from a JSON file
pub fn load_parameters_json(path: &Path) -> Result<SimulationParameters> {
    let file = File::open(path)?;
    let params = serde_json::from_reader(BufReader::new(file))?;
    Ok(params)
}

/// Load claim costs and severity mix from CSV
/// Columns: Tier, MonthlyBenefit, Probability
pub fn load_claim_costs(path: &Path) -> Result<(ClaimCostTable, SeverityDistribution)> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);

    let mut benefits = Vec::new();
    let mut probabilities = Vec::new();

    for result in reader.deserialize() {
        let row: ClaimCostRow = result?;
        benefits.push((row.tier, row.monthly_benefit));
        probabilities.push((row.tier, row.probability));
    }

    if benefits.is_empty() {
        return Err(PricingError::InvalidSeverity(format!(
            "{} contains no tiers",
            path.display()
        )));
    }

    let table = ClaimCostTable::new(benefits, DEFAULT_TIER_BENEFIT);
    let severity = SeverityDistribution::new(probabilities);
    table.validate()?;
    severity.validate()?;

    Ok((table, severity))
}

/// All assumption files found in a directory
pub struct LoadedAssumptions {
    pub parameters: Option<SimulationParameters>,
    pub claim_table: Option<(ClaimCostTable, SeverityDistribution)>,
}

impl LoadedAssumptions {
    /// Load all assumptions from the default path
    pub fn load_default() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_ASSUMPTIONS_PATH))
    }

    /// Load all assumptions from a specific path; absent files are skipped
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.is_dir() {
            return Err(PricingError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("assumptions directory {} not found", path.display()),
            )));
        }

        let params_path = path.join(PARAMETERS_FILE);
        let parameters = if params_path.exists() {
            log::info!("Loading parameters from {}", params_path.display());
            Some(load_parameters_json(&params_path)?)
        } else {
            None
        };

        let claims_path = path.join(CLAIM_COSTS_FILE);
        let claim_table = if claims_path.exists() {
            log::info!("Loading claim costs from {}", claims_path.display());
            Some(load_claim_costs(&claims_path)?)
        } else {
            None
        };

        Ok(Self { parameters, claim_table })
    }
}
