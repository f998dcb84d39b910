//! Tests for per-dataset normalization into tidy tables

mod common;

use common::*;
use polars::prelude::*;

use auric::pipeline::{
    clean_column_names, clean_name, tidy_bitcoin, tidy_currency, tidy_gold, tidy_index,
    tidy_indicators, BitcoinSources,
};

#[test]
fn test_clean_name_snake_cases() {
    assert_eq!(clean_name("USD (AM)"), "usd_am");
    assert_eq!(clean_name("S&P Composite"), "s_p_composite");
    assert_eq!(clean_name("GDP (current US$)"), "gdp_current_us");
    assert_eq!(clean_name("Country Name"), "country_name");
    assert_eq!(clean_name("already_clean"), "already_clean");
}

#[test]
fn test_clean_column_names_deduplicates() {
    let mut df = df! {
        "A B" => [1.0f64],
        "a_b" => [2.0f64],
        "A-B" => [3.0f64],
    }
    .unwrap();

    clean_column_names(&mut df).unwrap();
    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    assert_eq!(names, vec!["a_b", "a_b_2", "a_b_3"]);
}

#[test]
fn test_tidy_indicators_shape() {
    let tidy = tidy_indicators(&create_indicators_frame()).unwrap();

    assert_has_columns(&tidy, &["country", "year", "gdp", "broad_money", "gross_savings"]);
    assert_missing_columns(&tidy, &["Country Code", "Indicator Code", "country_code"]);
    // 2 countries x 16 years
    assert_eq!(tidy.height(), 32);
}

#[test]
fn test_tidy_indicators_values() {
    let tidy = tidy_indicators(&create_indicators_frame()).unwrap();

    let world_1970 = tidy
        .clone()
        .lazy()
        .filter(
            col("country")
                .eq(lit("World"))
                .and(col("year").eq(lit(1970))),
        )
        .collect()
        .unwrap();

    assert_eq!(world_1970.height(), 1);
    let gdp = world_1970
        .column("gdp")
        .unwrap()
        .f64()
        .unwrap()
        .get(0)
        .unwrap();
    assert_eq!(gdp, 1000.0);
}

#[test]
fn test_tidy_indicators_preserves_missing() {
    let tidy = tidy_indicators(&create_indicators_frame()).unwrap();

    // savings is unobserved for years divisible by 4, for both countries
    let savings_nulls = tidy.column("gross_savings").unwrap().null_count();
    assert_eq!(savings_nulls, 8);
}

#[test]
fn test_tidy_currency_melts_and_drops_nulls() {
    let tidy = tidy_currency(&create_currency_frame()).unwrap();

    assert_has_columns(&tidy, &["date", "currency", "rate"]);
    // 3 observed Euro rates + 4 Yen rates
    assert_eq!(tidy.height(), 7);
    assert_eq!(tidy.column("rate").unwrap().null_count(), 0);
}

#[test]
fn test_tidy_gold_columns() {
    let tidy = tidy_gold(&create_gold_frame()).unwrap();

    assert_has_columns(&tidy, &["date", "usd_am", "usd_pm"]);
    assert_eq!(tidy.width(), 3);
    assert_eq!(tidy.height(), 32);
}

#[test]
fn test_tidy_index_renames() {
    let tidy = tidy_index(&create_index_frame()).unwrap();

    assert_has_columns(&tidy, &["date", "sp_composite"]);
    assert_missing_columns(&tidy, &["Year", "S&P Composite", "s_p_composite"]);
}

#[test]
fn test_tidy_bitcoin_combines_metrics() {
    let sources = BitcoinSources {
        market_price: create_bitcoin_frame(1.0),
        total_supply: create_bitcoin_frame(1_000_000.0),
        market_cap: create_bitcoin_frame(5_000_000.0),
        trade_volume: create_bitcoin_frame(100.0),
    };

    let tidy = tidy_bitcoin(&sources).unwrap();
    assert_has_columns(
        &tidy,
        &[
            "date",
            "market_price_usd",
            "total_bitcoins",
            "market_cap_usd",
            "trade_volume_usd",
        ],
    );
    assert_eq!(tidy.height(), 3);
}

#[test]
fn test_tidy_bitcoin_outer_join_keeps_unmatched_dates() {
    let extra = df! {
        "Date" => ["2012-01-01", "2012-01-02", "2012-01-03", "2012-01-04"],
        "Value" => [1.0f64, 2.0, 3.0, 4.0],
    }
    .unwrap();

    let sources = BitcoinSources {
        market_price: create_bitcoin_frame(1.0),
        total_supply: extra,
        market_cap: create_bitcoin_frame(5_000_000.0),
        trade_volume: create_bitcoin_frame(100.0),
    };

    let tidy = tidy_bitcoin(&sources).unwrap();
    // The extra date survives with nulls in the other metrics
    assert_eq!(tidy.height(), 4);
    assert_eq!(tidy.column("market_price_usd").unwrap().null_count(), 1);
    assert_eq!(tidy.column("total_bitcoins").unwrap().null_count(), 0);
}
