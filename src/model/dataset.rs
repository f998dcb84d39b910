//! In-memory numeric dataset for model fitting

use anyhow::{bail, Result};
use polars::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Dense feature matrix with labels and feature names
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature rows (n_samples x n_features)
    pub features: Vec<Vec<f64>>,
    /// Target values, one per row
    pub labels: Vec<f64>,
    /// Ordered predictor names
    pub feature_names: Vec<String>,
}

/// Train/test partition of a dataset
pub struct Split {
    pub train: Dataset,
    pub test: Dataset,
}

impl Dataset {
    pub fn new(feature_names: Vec<String>) -> Self {
        Self {
            features: Vec::new(),
            labels: Vec::new(),
            feature_names,
        }
    }

    /// Build a dataset from a fully-populated DataFrame
    ///
    /// `target` becomes the label; columns named in `exclude` are left out
    /// of the predictor set. Null cells are a hard error: imputation runs
    /// before modelling.
    pub fn from_dataframe(df: &DataFrame, target: &str, exclude: &[&str]) -> Result<Self> {
        let feature_names: Vec<String> = df
            .get_columns()
            .iter()
            .filter(|col| {
                let name = col.name().as_str();
                col.dtype().is_primitive_numeric()
                    && name != target
                    && !exclude.contains(&name)
            })
            .map(|col| col.name().to_string())
            .collect();

        if feature_names.is_empty() {
            bail!("No numeric predictor columns remain for '{}'", target);
        }

        let mut columns = Vec::with_capacity(feature_names.len());
        for name in &feature_names {
            let ca = df.column(name)?.cast(&DataType::Float64)?;
            let values: Vec<f64> = ca
                .f64()?
                .into_iter()
                .map(|v| v.ok_or_else(|| anyhow::anyhow!("Null value in predictor '{}'", name)))
                .collect::<Result<_>>()?;
            columns.push(values);
        }

        let labels: Vec<f64> = df
            .column(target)?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.ok_or_else(|| anyhow::anyhow!("Null value in target '{}'", target)))
            .collect::<Result<_>>()?;

        let n = labels.len();
        let features: Vec<Vec<f64>> = (0..n)
            .map(|row| columns.iter().map(|col| col[row]).collect())
            .collect();

        Ok(Self {
            features,
            labels,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn add_row(&mut self, features: Vec<f64>, label: f64) {
        assert_eq!(features.len(), self.feature_names.len());
        self.features.push(features);
        self.labels.push(label);
    }

    /// Rows selected by index, in the given order
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            feature_names: self.feature_names.clone(),
        }
    }

    /// Seeded bootstrap draw (with replacement), returned as row indices
    pub fn bootstrap_indices(&self, seed: u64) -> Vec<usize> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = self.n_samples();
        (0..n).map(|_| rng.gen_range(0..n)).collect()
    }
}
