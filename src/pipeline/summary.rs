//! Descriptive per-column statistics and completeness filtering

use anyhow::Result;
use polars::prelude::*;
use serde::Serialize;

/// Descriptive statistics for one column of a tidy table
#[derive(Debug, Clone, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub observed: usize,
    pub missing_fraction: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// Summarize every column: completeness always, moments for numeric columns
pub fn summarize_columns(df: &DataFrame) -> Result<Vec<ColumnSummary>> {
    let height = df.height();
    let mut summaries = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let nulls = column.null_count();
        let observed = height - nulls;
        let missing_fraction = if height == 0 {
            0.0
        } else {
            nulls as f64 / height as f64
        };

        let (mean, std, min, max) = if column.dtype().is_primitive_numeric() {
            let ca = column.cast(&DataType::Float64)?;
            let values: Vec<f64> = ca.f64()?.into_iter().flatten().collect();
            numeric_moments(&values)
        } else {
            (None, None, None, None)
        };

        summaries.push(ColumnSummary {
            name: column.name().to_string(),
            observed,
            missing_fraction,
            mean,
            std,
            min,
            max,
        });
    }

    Ok(summaries)
}

fn numeric_moments(values: &[f64]) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    if values.is_empty() {
        return (None, None, None, None);
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let std = if values.len() > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    } else {
        None
    };
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    (Some(mean), std, Some(min), Some(max))
}

/// Missing-value fraction per column, sorted descending
pub fn missing_ratios(df: &DataFrame) -> Vec<(String, f64)> {
    let height = df.height();
    let mut ratios: Vec<(String, f64)> = df
        .get_columns()
        .iter()
        .map(|column| {
            let ratio = if height == 0 {
                0.0
            } else {
                column.null_count() as f64 / height as f64
            };
            (column.name().to_string(), ratio)
        })
        .collect();

    ratios.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ratios
}

/// Drop columns whose missing fraction is not strictly below `cutoff`
///
/// Columns named in `keep` are exempt regardless of completeness
/// (identifier columns such as country or year). Returns the filtered
/// table and the names that were dropped.
pub fn drop_sparse_columns(
    df: &DataFrame,
    cutoff: f64,
    keep: &[&str],
) -> Result<(DataFrame, Vec<String>)> {
    let height = df.height();
    let dropped: Vec<String> = df
        .get_columns()
        .iter()
        .filter(|column| {
            if keep.contains(&column.name().as_str()) {
                return false;
            }
            let ratio = if height == 0 {
                0.0
            } else {
                column.null_count() as f64 / height as f64
            };
            // qualifies only when strictly below the cutoff
            ratio >= cutoff
        })
        .map(|column| column.name().to_string())
        .collect();

    let filtered = df.drop_many(dropped.iter().map(|s| s.as_str()));
    Ok((filtered, dropped))
}
