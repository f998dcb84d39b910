//! End-to-end pipeline tests against a synthetic data directory

mod common;

use common::*;

use auric::model::{train_and_evaluate, Dataset, TrainConfig};
use auric::pipeline::{
    drop_sparse_columns, impute_random_forest, join_yearly, load_sources, select_redundant,
    tidy_gold, tidy_index, tidy_indicators, world_indicators, yearly_gold, yearly_index,
    CorrelationMatrix, ImputeConfig, SourcePaths, GOLD_COLUMN,
};

#[test]
fn test_load_sources_from_data_dir() {
    let (_guard, dir) = create_data_dir();
    let raw = load_sources(&SourcePaths::from_dir(&dir)).unwrap();

    assert_eq!(raw.gold.height(), 32);
    assert_eq!(raw.index.height(), 32);
    assert_eq!(raw.bitcoin.market_price.height(), 3);
    assert_eq!(raw.indicators.height(), 6);
}

#[test]
fn test_load_sources_rejects_bad_schema() {
    let (_guard, dir) = create_data_dir();

    // Overwrite the gold file with a wrong layout
    let mut bad = polars::df! {
        "Date" => ["2000-01-01"],
        "Price" => [300.0f64],
    }
    .unwrap();
    write_csv(&mut bad, &dir.join("gold_prices.csv"));

    let err = load_sources(&SourcePaths::from_dir(&dir)).unwrap_err();
    assert!(err.to_string().contains("USD (AM)"));
}

#[test]
fn test_sparse_cutoff_is_strict() {
    let df = polars::df! {
        "year" => [1970i32, 1971, 1972, 1973, 1974, 1975, 1976, 1977, 1978, 1979],
        "half_missing" => [
            Some(1.0f64), Some(2.0), Some(3.0), Some(4.0), Some(5.0),
            None, None, None, None, None,
        ],
        "mostly_present" => [
            None, Some(2.0f64), Some(3.0), Some(4.0), Some(5.0),
            Some(6.0), None, None, None, Some(10.0),
        ],
    }
    .unwrap();

    let (filtered, dropped) = drop_sparse_columns(&df, 0.5, &["year"]).unwrap();

    // Exactly half missing is already too sparse; 40% missing survives
    assert_eq!(dropped, vec!["half_missing".to_string()]);
    assert_has_columns(&filtered, &["year", "mostly_present"]);
    assert_missing_columns(&filtered, &["half_missing"]);
}

#[test]
fn test_full_pipeline_on_synthetic_data() {
    let (_guard, dir) = create_data_dir();
    let raw = load_sources(&SourcePaths::from_dir(&dir)).unwrap();

    let indicators = tidy_indicators(&raw.indicators).unwrap();
    // Completeness over all (country, year) rows: savings is 25% missing,
    // below the cutoff
    let (indicators, dropped_sparse) =
        drop_sparse_columns(&indicators, 0.5, &["country", "year"]).unwrap();
    assert!(dropped_sparse.is_empty());
    let world = world_indicators(&indicators).unwrap();

    let gold = yearly_gold(&tidy_gold(&raw.gold).unwrap()).unwrap();
    let index = yearly_index(&tidy_index(&raw.index).unwrap()).unwrap();
    let joined = join_yearly(&world, &gold, &index).unwrap();
    assert_eq!(joined.height(), 16);

    // gdp and broad_money are linear transforms of each other
    let predictor_matrix = CorrelationMatrix::compute(&joined, &["year", GOLD_COLUMN]).unwrap();
    let redundant = select_redundant(&predictor_matrix, 0.9);
    assert!(!redundant.is_empty());
    let reduced = joined.drop_many(redundant.iter().map(|s| s.as_str()));
    assert_has_columns(&reduced, &["year", GOLD_COLUMN]);

    let imputed = impute_random_forest(
        &reduced,
        &ImputeConfig {
            max_iterations: 3,
            n_trees: 10,
            seed: 42,
        },
    )
    .unwrap();
    for column in imputed.table.get_columns() {
        assert_eq!(column.null_count(), 0);
    }

    let data = Dataset::from_dataframe(&imputed.table, GOLD_COLUMN, &["year"]).unwrap();
    assert_eq!(data.n_samples(), 16);

    let (_, evaluation) = train_and_evaluate(
        &data,
        &TrainConfig {
            n_trees: 25,
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(evaluation.train_rows + evaluation.test_rows, 16);
    assert!(evaluation.rmse.is_finite());
    assert!(!evaluation.importances.is_empty());
    let total: f64 = evaluation.importances.iter().map(|(_, v)| v).sum();
    assert!((total - 1.0).abs() < 1e-9);
}

#[test]
fn test_pipeline_is_reproducible() {
    let (_guard, dir) = create_data_dir();
    let raw = load_sources(&SourcePaths::from_dir(&dir)).unwrap();

    let indicators = tidy_indicators(&raw.indicators).unwrap();
    let world = world_indicators(&indicators).unwrap();
    let gold = yearly_gold(&tidy_gold(&raw.gold).unwrap()).unwrap();
    let index = yearly_index(&tidy_index(&raw.index).unwrap()).unwrap();
    let joined = join_yearly(&world, &gold, &index).unwrap();

    let imputed = impute_random_forest(&joined, &ImputeConfig::default()).unwrap();
    let data = Dataset::from_dataframe(&imputed.table, GOLD_COLUMN, &["year"]).unwrap();

    let config = TrainConfig {
        n_trees: 25,
        ..Default::default()
    };
    let (_, a) = train_and_evaluate(&data, &config).unwrap();
    let (_, b) = train_and_evaluate(&data, &config).unwrap();

    assert_eq!(a.r_squared, b.r_squared);
    assert_eq!(a.rmse, b.rmse);
    assert_eq!(a.importances, b.importances);
}
