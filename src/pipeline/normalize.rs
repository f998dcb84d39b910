//! Per-dataset normalization into tidy tables
//!
//! Each raw source gets its own fixed rule set: the indicator sheet is
//! reshaped from one-row-per-(country, indicator) into one-row-per-
//! (country, year), the currency table is melted into (date, currency)
//! observations, gold and the S&P composite only need renaming, and the
//! four Bitcoin series are outer-joined on date.

use anyhow::{Context, Result};
use polars::prelude::pivot::pivot_stable;
use polars::prelude::*;

use super::loader::BitcoinSources;

/// Normalize a single column name to lowercase snake_case
pub fn clean_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_sep = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_was_sep = false;
        } else if !last_was_sep {
            out.push('_');
            last_was_sep = true;
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Normalize all column names in place, de-duplicating collisions
///
/// Distinct raw names can clean to the same snake_case string; collisions
/// get a numeric suffix so the tidy-table invariant (unique names) holds.
pub fn clean_column_names(df: &mut DataFrame) -> Result<()> {
    let mut seen: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    let cleaned: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|raw| {
            let base = clean_name(raw.as_str());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                base
            } else {
                format!("{}_{}", base, count)
            }
        })
        .collect();

    df.set_column_names(cleaned)
        .context("Failed to apply normalized column names")?;
    Ok(())
}

/// Reshape the World Development Indicators sheet into one row per
/// (country, year) with one column per indicator
pub fn tidy_indicators(raw: &DataFrame) -> Result<DataFrame> {
    // Identifier codes duplicate the name columns and are dropped outright
    let df = raw.drop_many(["Country Code", "Indicator Code"]);

    let year_cols: Vec<PlSmallStr> = df
        .get_column_names()
        .iter()
        .filter(|name| name.as_str() != "Country Name" && name.as_str() != "Indicator Name")
        .map(|name| name.as_str().into())
        .collect();
    let id_cols: Vec<PlSmallStr> = vec!["Country Name".into(), "Indicator Name".into()];

    let long = df
        .unpivot(year_cols, id_cols)
        .context("Failed to unpivot indicator year columns")?;

    let long = long
        .lazy()
        .select([
            col("Country Name").alias("country"),
            col("Indicator Name").alias("indicator"),
            col("variable").cast(DataType::Int32).alias("year"),
            col("value").cast(DataType::Float64),
        ])
        .collect()
        .context("Failed to coerce indicator year/value columns")?;

    let mut wide = pivot_stable(
        &long,
        ["indicator"],
        Some(["country", "year"]),
        Some(["value"]),
        true,
        None,
        None,
    )
    .context("Failed to pivot indicators into columns")?;

    clean_column_names(&mut wide)?;

    let country = wide
        .column("country")?
        .cast(&DataType::Categorical(None, Default::default()))?;
    wide.with_column(country)?;

    Ok(wide)
}

/// Melt the currency table into one row per (date, currency), dropping
/// unobserved rates
///
/// The result is produced for the descriptive summary only: rate
/// directionality is inconsistent across currencies in the raw data (some
/// quote local-to-USD, some USD-to-local), so the dataset is excluded from
/// every downstream analysis step rather than "corrected".
pub fn tidy_currency(raw: &DataFrame) -> Result<DataFrame> {
    let value_cols: Vec<PlSmallStr> = raw
        .get_column_names()
        .iter()
        .filter(|name| name.as_str() != "Date")
        .map(|name| name.as_str().into())
        .collect();
    let id_cols: Vec<PlSmallStr> = vec!["Date".into()];

    let long = raw
        .unpivot(value_cols, id_cols)
        .context("Failed to unpivot currency columns")?;

    let mut tidy = long
        .lazy()
        .select([
            col("Date").alias("date"),
            col("variable").alias("currency"),
            col("value").cast(DataType::Float64).alias("rate"),
        ])
        .drop_nulls(Some(vec![col("rate")]))
        .collect()
        .context("Failed to tidy currency rates")?;

    let currency = tidy
        .column("currency")?
        .cast(&DataType::Categorical(None, Default::default()))?;
    tidy.with_column(currency)?;

    Ok(tidy)
}

/// Rename the gold price columns; only the USD morning/afternoon fixings
/// are carried forward
pub fn tidy_gold(raw: &DataFrame) -> Result<DataFrame> {
    raw.clone()
        .lazy()
        .select([
            col("Date").alias("date"),
            col("USD (AM)").cast(DataType::Float64).alias("usd_am"),
            col("USD (PM)").cast(DataType::Float64).alias("usd_pm"),
        ])
        .collect()
        .context("Failed to tidy gold prices")
}

/// Rename the S&P composite columns to the normalized convention
pub fn tidy_index(raw: &DataFrame) -> Result<DataFrame> {
    let mut df = raw.clone();
    clean_column_names(&mut df)?;
    // "Year" holds a full date, one row per month
    if df.get_column_names().iter().any(|n| n.as_str() == "year") {
        df.rename("year", "date".into())?;
    }
    if df
        .get_column_names()
        .iter()
        .any(|n| n.as_str() == "s_p_composite")
    {
        df.rename("s_p_composite", "sp_composite".into())?;
    }
    // DataFrame::rename leaves the cached schema stale in polars 0.46, which
    // makes later lazy queries resolve against the pre-rename column names
    df.clear_schema();
    Ok(df)
}

/// Combine the four single-metric Bitcoin series into one row per date
///
/// Full outer joins keep every observed date; a metric missing for a date
/// stays null.
pub fn tidy_bitcoin(sources: &BitcoinSources) -> Result<DataFrame> {
    let metric = |df: &DataFrame, name: &str| -> LazyFrame {
        df.clone().lazy().select([
            col("Date").alias("date"),
            col("Value").cast(DataType::Float64).alias(name),
        ])
    };

    let args = JoinArgs::new(JoinType::Full).with_coalesce(JoinCoalesce::CoalesceColumns);

    metric(&sources.market_price, "market_price_usd")
        .join(
            metric(&sources.total_supply, "total_bitcoins"),
            [col("date")],
            [col("date")],
            args.clone(),
        )
        .join(
            metric(&sources.market_cap, "market_cap_usd"),
            [col("date")],
            [col("date")],
            args.clone(),
        )
        .join(
            metric(&sources.trade_volume, "trade_volume_usd"),
            [col("date")],
            [col("date")],
            args,
        )
        .sort(["date"], Default::default())
        .collect()
        .context("Failed to combine Bitcoin series")
}
