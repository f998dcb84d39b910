//! Pairwise-complete correlation analysis
//!
//! Correlations are computed per variable pair over the rows where both
//! variables are observed. A pair with fewer than two jointly observed
//! rows (or zero variance on either side) is undefined and stored as NaN.

use anyhow::Result;
use faer::Mat;
use polars::prelude::*;
use rayon::prelude::*;

/// A correlated pair of variables surviving a reporting filter
#[derive(Debug, Clone, serde::Serialize)]
pub struct CorrelatedPair {
    pub var1: String,
    pub var2: String,
    pub correlation: f64,
}

/// Square symmetric matrix of pairwise-complete Pearson coefficients
///
/// Undefined cells hold NaN. Reporting accessors mask to the strict lower
/// triangle so symmetric duplicates and the diagonal never reach output.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    names: Vec<String>,
    values: Mat<f64>,
}

impl CorrelationMatrix {
    /// Compute the matrix over every numeric column of `df` except those
    /// named in `exclude`
    pub fn compute(df: &DataFrame, exclude: &[&str]) -> Result<Self> {
        let float_columns: Vec<(String, Column)> = df
            .get_columns()
            .iter()
            .filter(|col| {
                col.dtype().is_primitive_numeric() && !exclude.contains(&col.name().as_str())
            })
            .filter_map(|col| {
                col.cast(&DataType::Float64)
                    .ok()
                    .map(|cast| (col.name().to_string(), cast))
            })
            .collect();

        let n = float_columns.len();
        let names: Vec<String> = float_columns.iter().map(|(name, _)| name.clone()).collect();

        let mut values = Mat::<f64>::zeros(n, n);

        // Diagonal: 1 unless the column has no variance at all
        for (i, (_, col)) in float_columns.iter().enumerate() {
            let ca = col.f64()?;
            values[(i, i)] = if has_variance(ca) { 1.0 } else { f64::NAN };
        }

        // Upper-triangle pair indices, evaluated in parallel
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| ((i + 1)..n).map(move |j| (i, j)))
            .collect();

        let computed: Vec<(usize, usize, f64)> = pairs
            .par_iter()
            .map(|&(i, j)| {
                let r = pairwise_pearson(
                    float_columns[i].1.f64().expect("cast to f64 above"),
                    float_columns[j].1.f64().expect("cast to f64 above"),
                );
                (i, j, r)
            })
            .collect();

        for (i, j, r) in computed {
            values[(i, j)] = r;
            values[(j, i)] = r;
        }

        Ok(Self { names, values })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Coefficient for a pair of variable indices (NaN when undefined)
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[(i, j)]
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// All defined coefficients from the strict lower triangle
    pub fn masked_pairs(&self) -> Vec<CorrelatedPair> {
        let mut pairs = Vec::new();
        for i in 1..self.len() {
            for j in 0..i {
                let r = self.values[(i, j)];
                if !r.is_nan() {
                    pairs.push(CorrelatedPair {
                        var1: self.names[j].clone(),
                        var2: self.names[i].clone(),
                        correlation: r,
                    });
                }
            }
        }
        pairs
    }

    /// Overview filter: pairs with `lo < |r| < hi`, sorted by |r| descending
    ///
    /// The band excludes near-trivial near-1 pairs as well as weak ones.
    pub fn band_pairs(&self, lo: f64, hi: f64) -> Vec<CorrelatedPair> {
        let mut pairs: Vec<CorrelatedPair> = self
            .masked_pairs()
            .into_iter()
            .filter(|p| p.correlation.abs() > lo && p.correlation.abs() < hi)
            .collect();
        sort_by_abs_correlation(&mut pairs);
        pairs
    }

    /// Target-focused filter: pairs involving `target` with `|r| > min_abs`,
    /// sorted by |r| descending
    pub fn target_pairs(&self, target: &str, min_abs: f64) -> Vec<CorrelatedPair> {
        let mut pairs: Vec<CorrelatedPair> = self
            .masked_pairs()
            .into_iter()
            .filter(|p| {
                (p.var1 == target || p.var2 == target) && p.correlation.abs() > min_abs
            })
            .collect();
        sort_by_abs_correlation(&mut pairs);
        pairs
    }
}

fn sort_by_abs_correlation(pairs: &mut [CorrelatedPair]) {
    pairs.sort_by(|a, b| {
        b.correlation
            .abs()
            .partial_cmp(&a.correlation.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn has_variance(ca: &Float64Chunked) -> bool {
    let mut first: Option<f64> = None;
    for value in ca.iter().flatten() {
        match first {
            None => first = Some(value),
            Some(f) if (value - f).abs() > 0.0 => return true,
            _ => {}
        }
    }
    false
}

/// Pearson correlation over jointly observed rows using a single-pass
/// Welford accumulator
///
/// Returns NaN when fewer than two rows are jointly observed or either
/// side has zero variance over the joint rows.
pub fn pairwise_pearson(xs: &Float64Chunked, ys: &Float64Chunked) -> f64 {
    let mut n = 0usize;
    let mut mean_x = 0.0;
    let mut mean_y = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    let mut cov_xy = 0.0;

    for (x, y) in xs.iter().zip(ys.iter()) {
        if let (Some(x), Some(y)) = (x, y) {
            n += 1;
            let dx = x - mean_x;
            let dy = y - mean_y;
            mean_x += dx / n as f64;
            mean_y += dy / n as f64;
            var_x += dx * (x - mean_x);
            var_y += dy * (y - mean_y);
            cov_xy += dx * (y - mean_y);
        }
    }

    if n < 2 {
        return f64::NAN;
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }

    cov_xy / denom
}
