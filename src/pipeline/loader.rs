//! Dataset loader for the six raw CSV sources
//!
//! Each source has a fixed expected column layout. A layout mismatch is a
//! hard failure: the report cannot be generated from unknown columns.

use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Schema validation failures for raw sources
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("{source_name}: expected column '{column}' not found (columns present: {found:?})")]
    MissingColumn {
        source_name: &'static str,
        column: String,
        found: Vec<String>,
    },
}

/// Paths to the raw CSV files, one per source
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub indicators: PathBuf,
    pub currency: PathBuf,
    pub gold: PathBuf,
    pub index: PathBuf,
    pub btc_market_price: PathBuf,
    pub btc_total_supply: PathBuf,
    pub btc_market_cap: PathBuf,
    pub btc_trade_volume: PathBuf,
}

impl SourcePaths {
    /// Resolve the default file names inside a data directory
    pub fn from_dir(dir: &Path) -> Self {
        Self {
            indicators: dir.join("world_development_indicators.csv"),
            currency: dir.join("currency_exchange_rates.csv"),
            gold: dir.join("gold_prices.csv"),
            index: dir.join("sp_composite.csv"),
            btc_market_price: dir.join("bitcoin_market_price.csv"),
            btc_total_supply: dir.join("bitcoin_total_supply.csv"),
            btc_market_cap: dir.join("bitcoin_market_cap.csv"),
            btc_trade_volume: dir.join("bitcoin_trade_volume.csv"),
        }
    }
}

/// The four single-metric Bitcoin time series
#[derive(Debug, Clone)]
pub struct BitcoinSources {
    pub market_price: DataFrame,
    pub total_supply: DataFrame,
    pub market_cap: DataFrame,
    pub trade_volume: DataFrame,
}

/// All raw tables, loaded verbatim and schema-checked
#[derive(Debug, Clone)]
pub struct RawSources {
    pub indicators: DataFrame,
    pub currency: DataFrame,
    pub gold: DataFrame,
    pub index: DataFrame,
    pub bitcoin: BitcoinSources,
}

/// Load a single CSV file into an eager DataFrame
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    let lf = LazyCsvReader::new(path)
        .finish()
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    lf.collect()
        .with_context(|| format!("Failed to read CSV file: {}", path.display()))
}

/// Validate that a raw table carries the expected column layout
pub fn ensure_columns(df: &DataFrame, source: &'static str, expected: &[&str]) -> Result<()> {
    let found: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    for column in expected {
        if !found.iter().any(|c| c == column) {
            return Err(SchemaError::MissingColumn {
                source_name: source,
                column: column.to_string(),
                found,
            }
            .into());
        }
    }

    Ok(())
}

/// Load and schema-check all six sources
pub fn load_sources(paths: &SourcePaths) -> Result<RawSources> {
    let indicators = load_csv(&paths.indicators)?;
    ensure_columns(
        &indicators,
        "world development indicators",
        &["Country Name", "Country Code", "Indicator Name", "Indicator Code"],
    )?;

    let currency = load_csv(&paths.currency)?;
    ensure_columns(&currency, "currency exchange rates", &["Date"])?;

    let gold = load_csv(&paths.gold)?;
    ensure_columns(&gold, "gold prices", &["Date", "USD (AM)", "USD (PM)"])?;

    let index = load_csv(&paths.index)?;
    ensure_columns(&index, "S&P composite", &["Year", "S&P Composite"])?;

    let bitcoin = BitcoinSources {
        market_price: load_csv(&paths.btc_market_price)?,
        total_supply: load_csv(&paths.btc_total_supply)?,
        market_cap: load_csv(&paths.btc_market_cap)?,
        trade_volume: load_csv(&paths.btc_trade_volume)?,
    };
    for (df, source) in [
        (&bitcoin.market_price, "bitcoin market price"),
        (&bitcoin.total_supply, "bitcoin total supply"),
        (&bitcoin.market_cap, "bitcoin market cap"),
        (&bitcoin.trade_volume, "bitcoin trade volume"),
    ] {
        ensure_columns(df, source, &["Date", "Value"])?;
    }

    Ok(RawSources {
        indicators,
        currency,
        gold,
        index,
        bitcoin,
    })
}

/// Basic shape statistics for a loaded table
pub fn dataset_stats(df: &DataFrame) -> (usize, usize, f64) {
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    (rows, cols, memory_mb)
}
