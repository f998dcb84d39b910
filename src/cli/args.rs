//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

use crate::pipeline::SourcePaths;

/// Auric - Analyze gold price drivers across macroeconomic datasets
#[derive(Parser, Debug)]
#[command(name = "auric")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the raw CSV datasets
    #[arg(short, long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Override the World Development Indicators file
    #[arg(long)]
    pub indicators: Option<PathBuf>,

    /// Override the currency exchange rates file
    #[arg(long)]
    pub currency: Option<PathBuf>,

    /// Override the daily gold prices file
    #[arg(long)]
    pub gold: Option<PathBuf>,

    /// Override the S&P Composite file
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// JSON report output path.
    /// Defaults to 'auric_report.json' inside the data directory.
    #[arg(short, long)]
    pub report: Option<PathBuf>,

    /// Drop columns whose missing ratio reaches this value
    #[arg(long, default_value = "0.5", value_parser = validate_fraction)]
    pub sparse_threshold: f64,

    /// Lower bound of the reported indicator correlation band
    #[arg(long, default_value = "0.6", value_parser = validate_fraction)]
    pub band_low: f64,

    /// Upper bound of the reported indicator correlation band
    #[arg(long, default_value = "0.9", value_parser = validate_fraction)]
    pub band_high: f64,

    /// Drop one variable from pairs with absolute correlation above this value
    #[arg(long, default_value = "0.9", value_parser = validate_fraction)]
    pub collinearity_threshold: f64,

    /// Trees in the final Random Forest
    #[arg(long, default_value = "500")]
    pub trees: usize,

    /// Maximum imputation sweeps
    #[arg(long, default_value = "10")]
    pub impute_iterations: usize,

    /// Trees per imputation forest
    #[arg(long, default_value = "100")]
    pub impute_trees: usize,

    /// Seed for every stochastic stage (splits, bootstraps, imputation)
    #[arg(long, default_value = "42")]
    pub seed: u64,
}

impl Cli {
    /// Resolve the eight source paths, applying per-file overrides
    pub fn source_paths(&self) -> SourcePaths {
        let mut paths = SourcePaths::from_dir(&self.data_dir);
        if let Some(indicators) = &self.indicators {
            paths.indicators = indicators.clone();
        }
        if let Some(currency) = &self.currency {
            paths.currency = currency.clone();
        }
        if let Some(gold) = &self.gold {
            paths.gold = gold.clone();
        }
        if let Some(index) = &self.index {
            paths.index = index.clone();
        }
        paths
    }

    /// Report path, derived from the data directory if not explicitly provided
    pub fn report_path(&self) -> PathBuf {
        self.report
            .clone()
            .unwrap_or_else(|| self.data_dir.join("auric_report.json"))
    }
}

/// Validator for ratio parameters
fn validate_fraction(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!("value must be between 0.0 and 1.0, got {}", value))
    } else {
        Ok(value)
    }
}
