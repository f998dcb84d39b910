//! Iterative Random-Forest imputation of missing predictor values
//!
//! Each column with missing values is predicted from all other columns
//! using a Random Forest fit on the rows where the column is observed.
//! Columns are visited in ascending order of missingness and the whole
//! sweep repeats until the imputed values stop improving or an iteration
//! cap is reached. Out-of-bag error per imputed variable is reported as a
//! diagnostic only; nothing downstream is gated on it.

use anyhow::{bail, Result};
use polars::prelude::*;

use crate::model::{Dataset, ForestParams, RandomForest, Regressor};

/// Imputation parameters
#[derive(Debug, Clone)]
pub struct ImputeConfig {
    pub max_iterations: usize,
    pub n_trees: usize,
    pub seed: u64,
}

impl Default for ImputeConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            n_trees: 100,
            seed: 42,
        }
    }
}

/// Out-of-bag error estimate for one imputed variable
#[derive(Debug, Clone, serde::Serialize)]
pub struct OobError {
    pub variable: String,
    /// OOB RMSE normalized by the observed standard deviation
    pub nrmse: f64,
}

/// Result of an imputation run
#[derive(Debug)]
pub struct ImputationOutcome {
    /// Same shape as the input, zero remaining missing values
    pub table: DataFrame,
    pub oob_errors: Vec<OobError>,
    /// Sweeps actually applied (0 when nothing was missing)
    pub iterations: usize,
}

/// Fill every missing numeric cell in `df`
pub fn impute_random_forest(df: &DataFrame, config: &ImputeConfig) -> Result<ImputationOutcome> {
    let numeric_names: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|col| col.dtype().is_primitive_numeric())
        .map(|col| col.name().to_string())
        .collect();

    if numeric_names.len() < 2 {
        bail!("Imputation needs at least two numeric columns");
    }

    let n_rows = df.height();
    let n_cols = numeric_names.len();

    // Column-major copy of the numeric block
    let mut observed: Vec<Vec<Option<f64>>> = Vec::with_capacity(n_cols);
    for name in &numeric_names {
        let ca = df.column(name)?.cast(&DataType::Float64)?;
        observed.push(ca.f64()?.into_iter().collect());
    }

    let missing_rows: Vec<Vec<usize>> = observed
        .iter()
        .map(|col| {
            col.iter()
                .enumerate()
                .filter_map(|(row, v)| v.is_none().then_some(row))
                .collect()
        })
        .collect();

    if missing_rows.iter().all(|rows| rows.is_empty()) {
        return Ok(ImputationOutcome {
            table: df.clone(),
            oob_errors: Vec::new(),
            iterations: 0,
        });
    }

    // Mean-initialize the working copy
    let mut current: Vec<Vec<f64>> = Vec::with_capacity(n_cols);
    for (c, col) in observed.iter().enumerate() {
        let values: Vec<f64> = col.iter().flatten().copied().collect();
        if values.is_empty() {
            bail!(
                "Column '{}' has no observed values to impute from",
                numeric_names[c]
            );
        }
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        current.push(col.iter().map(|v| v.unwrap_or(mean)).collect());
    }

    // Visit the least-missing columns first
    let mut targets: Vec<usize> = (0..n_cols).filter(|&c| !missing_rows[c].is_empty()).collect();
    targets.sort_by_key(|&c| missing_rows[c].len());

    let mut oob_by_col: Vec<Option<f64>> = vec![None; n_cols];
    let mut snapshot = current.clone();
    let mut prev_diff = f64::INFINITY;
    let mut iterations = 0usize;

    for iteration in 1..=config.max_iterations {
        for &c in &targets {
            let predictor_cols: Vec<usize> = (0..n_cols).filter(|&j| j != c).collect();
            let feature_names: Vec<String> = predictor_cols
                .iter()
                .map(|&j| numeric_names[j].clone())
                .collect();

            let mut train = Dataset::new(feature_names);
            for row in 0..n_rows {
                if let Some(label) = observed[c][row] {
                    let features: Vec<f64> =
                        predictor_cols.iter().map(|&j| current[j][row]).collect();
                    train.add_row(features, label);
                }
            }

            let mut forest = RandomForest::new(ForestParams {
                n_trees: config.n_trees,
                seed: config
                    .seed
                    .wrapping_add((iteration * n_cols + c) as u64),
                compute_oob: true,
                ..Default::default()
            });
            forest.fit(&train)?;

            if let Some(mse) = forest.oob_mse() {
                let std = population_std(&train.labels);
                oob_by_col[c] = Some(if std > 0.0 { mse.sqrt() / std } else { f64::NAN });
            }

            for &row in &missing_rows[c] {
                let features: Vec<f64> = predictor_cols.iter().map(|&j| current[j][row]).collect();
                current[c][row] = forest.predict_row(&features);
            }
        }

        // missForest stop rule: keep iterating while the imputed cells
        // still move closer together; revert the sweep that got worse
        let mut num = 0.0;
        let mut den = 0.0;
        for &c in &targets {
            for &row in &missing_rows[c] {
                num += (current[c][row] - snapshot[c][row]).powi(2);
                den += current[c][row].powi(2);
            }
        }
        let diff = if den > 0.0 { num / den } else { 0.0 };

        if diff > prev_diff {
            current = snapshot;
            break;
        }

        iterations = iteration;
        snapshot = current.clone();
        prev_diff = diff;
        if diff == 0.0 {
            break;
        }
    }

    // Reassemble, preserving column order and non-numeric columns
    let mut out = df.clone();
    for (c, name) in numeric_names.iter().enumerate() {
        out.replace(name, Series::new(name.as_str().into(), current[c].clone()))?;
    }

    let oob_errors: Vec<OobError> = targets
        .iter()
        .filter_map(|&c| {
            oob_by_col[c].map(|nrmse| OobError {
                variable: numeric_names[c].clone(),
                nrmse,
            })
        })
        .collect();

    Ok(ImputationOutcome {
        table: out,
        oob_errors,
        iterations,
    })
}

fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
