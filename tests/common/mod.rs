//! Shared test fixtures: small versions of the six raw datasets

#![allow(dead_code)]

use polars::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const YEARS: std::ops::RangeInclusive<i32> = 1970..=1985;

/// Raw World Development Indicators sheet: one row per (country, indicator),
/// one column per year.
///
/// Carries a "World" aggregate plus one real country, and three indicators:
/// - gdp: rises linearly with the year (tracks the gold fixture closely)
/// - broad_money: near-duplicate of gdp (collinear above 0.9)
/// - gross_savings: weaker signal with a few missing years
pub fn create_indicators_frame() -> DataFrame {
    let mut columns: Vec<Column> = vec![
        Column::new(
            "Country Name".into(),
            [
                "World", "World", "World", "Aruba", "Aruba", "Aruba",
            ]
            .as_slice(),
        ),
        Column::new(
            "Country Code".into(),
            ["WLD", "WLD", "WLD", "ABW", "ABW", "ABW"].as_slice(),
        ),
        Column::new(
            "Indicator Name".into(),
            [
                "Gdp", "Broad Money", "Gross Savings",
                "Gdp", "Broad Money", "Gross Savings",
            ]
            .as_slice(),
        ),
        Column::new(
            "Indicator Code".into(),
            ["GDP", "BM", "GS", "GDP", "BM", "GS"].as_slice(),
        ),
    ];

    for year in YEARS {
        let t = (year - 1970) as f64;
        let gdp = 1000.0 + 100.0 * t;
        let money = gdp * 1.5 + 3.0;
        // savings observed only for some years
        let savings = if year % 4 == 0 {
            None
        } else {
            Some(50.0 + 5.0 * t + if year % 2 == 0 { 4.0 } else { -4.0 })
        };
        columns.push(Column::new(
            format!("{}", year).into(),
            [
                Some(gdp),
                Some(money),
                savings,
                Some(gdp * 0.01),
                Some(money * 0.01),
                savings.map(|s| s * 0.01),
            ]
            .as_slice(),
        ));
    }

    DataFrame::new(columns).unwrap()
}

/// Raw currency exchange rate sheet: Date plus one column per currency
pub fn create_currency_frame() -> DataFrame {
    df! {
        "Date" => ["1995-01-02", "1995-01-03", "1995-01-04", "1995-01-05"],
        "Euro" => [Some(0.85f64), Some(0.86), None, Some(0.84)],
        "Japanese Yen" => [99.5f64, 99.7, 100.1, 100.4],
    }
    .unwrap()
}

/// Raw daily gold fixings: two days per year, rising with the year
pub fn create_gold_frame() -> DataFrame {
    let mut dates = Vec::new();
    let mut am = Vec::new();
    let mut pm = Vec::new();
    for year in YEARS {
        let t = (year - 1970) as f64;
        dates.push(format!("{}-03-01", year));
        am.push(Some(200.0 + 20.0 * t - 5.0));
        pm.push(Some(200.0 + 20.0 * t + 5.0));
        dates.push(format!("{}-09-01", year));
        am.push(Some(200.0 + 20.0 * t - 5.0));
        pm.push(Some(200.0 + 20.0 * t + 5.0));
    }

    df! {
        "Date" => dates,
        "USD (AM)" => am,
        "USD (PM)" => pm,
    }
    .unwrap()
}

/// Raw S&P Composite sheet: full-date "Year" column, monthly values
pub fn create_index_frame() -> DataFrame {
    let mut dates = Vec::new();
    let mut values = Vec::new();
    for year in YEARS {
        let t = (year - 1970) as f64;
        dates.push(format!("{}-01-31", year));
        values.push(90.0 + 8.0 * t);
        dates.push(format!("{}-07-31", year));
        values.push(110.0 + 8.0 * t);
    }

    df! {
        "Year" => dates,
        "S&P Composite" => values,
    }
    .unwrap()
}

/// One single-metric Bitcoin series
pub fn create_bitcoin_frame(scale: f64) -> DataFrame {
    df! {
        "Date" => ["2012-01-01", "2012-01-02", "2012-01-03"],
        "Value" => [5.0 * scale, 5.2 * scale, 5.4 * scale],
    }
    .unwrap()
}

/// Write a DataFrame to a CSV file
pub fn write_csv(df: &mut DataFrame, path: &Path) {
    let mut file = std::fs::File::create(path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();
}

/// Materialize all eight raw CSV files under a temp data directory
pub fn create_data_dir() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().to_path_buf();

    write_csv(
        &mut create_indicators_frame(),
        &dir.join("world_development_indicators.csv"),
    );
    write_csv(
        &mut create_currency_frame(),
        &dir.join("currency_exchange_rates.csv"),
    );
    write_csv(&mut create_gold_frame(), &dir.join("gold_prices.csv"));
    write_csv(&mut create_index_frame(), &dir.join("sp_composite.csv"));
    write_csv(
        &mut create_bitcoin_frame(1.0),
        &dir.join("bitcoin_market_price.csv"),
    );
    write_csv(
        &mut create_bitcoin_frame(1_000_000.0),
        &dir.join("bitcoin_total_supply.csv"),
    );
    write_csv(
        &mut create_bitcoin_frame(5_000_000.0),
        &dir.join("bitcoin_market_cap.csv"),
    );
    write_csv(
        &mut create_bitcoin_frame(100.0),
        &dir.join("bitcoin_trade_volume.csv"),
    );

    (temp_dir, dir)
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert that a DataFrame does NOT contain specific columns
pub fn assert_missing_columns(df: &DataFrame, unexpected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in unexpected_cols {
        assert!(
            !actual_cols.contains(&col.to_string()),
            "Unexpected column still present: '{}'",
            col
        );
    }
}
