//! Cross-dataset yearly aggregation and joining
//!
//! Produces one row per calendar year combining the "World" indicator
//! aggregate, the mean annual gold mid-price and the mean annual S&P
//! composite. Bitcoin is deliberately absent: its coverage starts late
//! enough that the metric would exceed the 50% missing cutoff across the
//! joined years.

use anyhow::{Context, Result};
use polars::prelude::*;

/// Name of the gold price column in the joined yearly table
pub const GOLD_COLUMN: &str = "gold_price";

/// Name of the index column in the joined yearly table
pub const INDEX_COLUMN: &str = "sp_composite";

/// Derive the calendar year from an ISO-dated string column
fn year_expr(date_col: &str) -> Expr {
    col(date_col)
        .str()
        .slice(lit(0), lit(4))
        .cast(DataType::Int32)
        .alias("year")
}

/// Mean annual gold mid-price
///
/// The daily mid-price is the mean of the morning and afternoon fixings;
/// days where either fixing is missing have no mid-price and are dropped
/// before aggregation.
pub fn yearly_gold(gold: &DataFrame) -> Result<DataFrame> {
    gold.clone()
        .lazy()
        .with_columns([
            ((col("usd_am") + col("usd_pm")) / lit(2.0)).alias("mid_price"),
            year_expr("date"),
        ])
        .drop_nulls(Some(vec![col("mid_price")]))
        .group_by([col("year")])
        .agg([col("mid_price").mean().alias(GOLD_COLUMN)])
        .sort(["year"], Default::default())
        .collect()
        .context("Failed to aggregate gold prices by year")
}

/// Mean annual S&P composite value
pub fn yearly_index(index: &DataFrame) -> Result<DataFrame> {
    index
        .clone()
        .lazy()
        .with_columns([year_expr("date")])
        .group_by([col("year")])
        .agg([col(INDEX_COLUMN).mean().alias(INDEX_COLUMN)])
        .sort(["year"], Default::default())
        .collect()
        .context("Failed to aggregate the index by year")
}

/// Restrict the tidy indicator table to the global aggregate rows
///
/// The WDI sheet carries a "World" pseudo-country; those rows are the
/// per-year global aggregates the yearly join consumes.
pub fn world_indicators(indicators: &DataFrame) -> Result<DataFrame> {
    indicators
        .clone()
        .lazy()
        .filter(col("country").eq(lit("World")))
        .select([col("*").exclude(["country"])])
        .sort(["year"], Default::default())
        .collect()
        .context("Failed to extract the World aggregate rows")
}

/// Join world indicators, yearly gold price and yearly index on year
///
/// Inner join against gold first (indicator-years without a gold price are
/// dropped), then left join the index (gold years without an index value
/// keep a null).
pub fn join_yearly(
    world: &DataFrame,
    gold_yearly: &DataFrame,
    index_yearly: &DataFrame,
) -> Result<DataFrame> {
    world
        .clone()
        .lazy()
        .join(
            gold_yearly.clone().lazy(),
            [col("year")],
            [col("year")],
            JoinArgs::new(JoinType::Inner),
        )
        .join(
            index_yearly.clone().lazy(),
            [col("year")],
            [col("year")],
            JoinArgs::new(JoinType::Left),
        )
        .sort(["year"], Default::default())
        .collect()
        .context("Failed to join the yearly datasets")
}
