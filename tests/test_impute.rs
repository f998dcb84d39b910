//! Tests for iterative Random-Forest imputation

use polars::prelude::*;

use auric::pipeline::{impute_random_forest, ImputeConfig};

fn config() -> ImputeConfig {
    ImputeConfig {
        max_iterations: 5,
        n_trees: 20,
        seed: 42,
    }
}

fn gapped_frame() -> DataFrame {
    let x: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let y: Vec<Option<f64>> = (0..24)
        .map(|i| {
            if i % 7 == 3 {
                None
            } else {
                Some(2.0 * i as f64 + 5.0)
            }
        })
        .collect();
    let z: Vec<f64> = (0..24).map(|i| (i % 5) as f64).collect();

    df! {
        "x" => x,
        "y" => y,
        "z" => z,
        "tag" => vec!["row"; 24],
    }
    .unwrap()
}

#[test]
fn test_imputation_fills_every_gap() {
    let df = gapped_frame();
    let before_nulls = df.column("y").unwrap().null_count();
    assert!(before_nulls > 0);

    let outcome = impute_random_forest(&df, &config()).unwrap();

    assert_eq!(outcome.table.shape(), df.shape());
    for column in outcome.table.get_columns() {
        assert_eq!(
            column.null_count(),
            0,
            "column '{}' still has nulls",
            column.name()
        );
    }
    assert!(outcome.iterations >= 1);
}

#[test]
fn test_observed_cells_are_untouched() {
    let df = gapped_frame();
    let outcome = impute_random_forest(&df, &config()).unwrap();

    let before = df.column("y").unwrap().f64().unwrap();
    let after = outcome.table.column("y").unwrap().f64().unwrap();

    for (orig, filled) in before.into_iter().zip(after.into_iter()) {
        if let Some(orig) = orig {
            assert_eq!(Some(orig), filled);
        }
    }

    // The complete column passes through bit-for-bit
    let x_before = df.column("x").unwrap().f64().unwrap();
    let x_after = outcome.table.column("x").unwrap().f64().unwrap();
    assert!(x_before
        .into_iter()
        .zip(x_after.into_iter())
        .all(|(a, b)| a == b));
}

#[test]
fn test_imputed_values_are_plausible() {
    let df = gapped_frame();
    let outcome = impute_random_forest(&df, &config()).unwrap();

    let before = df.column("y").unwrap().f64().unwrap();
    let after = outcome.table.column("y").unwrap().f64().unwrap();

    // y follows y = 2x + 5 exactly; forest predictions on the observed
    // neighbours should land within the observed range
    for (orig, filled) in before.into_iter().zip(after.into_iter()) {
        if orig.is_none() {
            let v = filled.unwrap();
            assert!((5.0..=51.0).contains(&v), "implausible imputed value {}", v);
        }
    }
}

#[test]
fn test_oob_errors_reported_per_gapped_column() {
    let df = gapped_frame();
    let outcome = impute_random_forest(&df, &config()).unwrap();

    assert_eq!(outcome.oob_errors.len(), 1);
    assert_eq!(outcome.oob_errors[0].variable, "y");
    assert!(outcome.oob_errors[0].nrmse.is_finite());
    assert!(outcome.oob_errors[0].nrmse >= 0.0);
}

#[test]
fn test_complete_table_short_circuits() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0],
        "y" => [4.0f64, 5.0, 6.0],
    }
    .unwrap();

    let outcome = impute_random_forest(&df, &config()).unwrap();
    assert_eq!(outcome.iterations, 0);
    assert!(outcome.oob_errors.is_empty());
    assert!(outcome.table.equals(&df));
}

#[test]
fn test_single_numeric_column_rejected() {
    let df = df! {
        "x" => [Some(1.0f64), None, Some(3.0)],
        "tag" => ["a", "b", "c"],
    }
    .unwrap();

    assert!(impute_random_forest(&df, &config()).is_err());
}

#[test]
fn test_fully_missing_column_rejected() {
    let df = df! {
        "x" => [1.0f64, 2.0, 3.0],
        "empty" => [None::<f64>, None, None],
    }
    .unwrap();

    assert!(impute_random_forest(&df, &config()).is_err());
}

#[test]
fn test_imputation_is_reproducible() {
    let df = gapped_frame();
    let a = impute_random_forest(&df, &config()).unwrap();
    let b = impute_random_forest(&df, &config()).unwrap();

    assert!(a.table.equals(&b.table));
    assert_eq!(a.iterations, b.iterations);
}
