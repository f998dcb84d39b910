//! Random Forest regressor
//!
//! Trees are fit in parallel on seeded bootstrap samples. Impurity-decrease
//! importances are aggregated across trees and normalized; an out-of-bag
//! score is computed from the samples each tree never saw.

use anyhow::{bail, Result};
use rayon::prelude::*;

use super::dataset::Dataset;
use super::tree::{RegressionTree, TreeParams};
use super::Regressor;

/// Forest construction parameters
#[derive(Debug, Clone)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features per split (None = n_features / 3, the regression default)
    pub max_features: Option<usize>,
    pub seed: u64,
    pub compute_oob: bool,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            max_depth: 10,
            min_samples_split: 4,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
            compute_oob: true,
        }
    }
}

/// A fitted Random Forest regression model
#[derive(Debug, Clone)]
pub struct RandomForest {
    params: ForestParams,
    trees: Vec<RegressionTree>,
    feature_names: Vec<String>,
    importances: Vec<f64>,
    oob_mse: Option<f64>,
    oob_r_squared: Option<f64>,
}

impl RandomForest {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            trees: Vec::new(),
            feature_names: Vec::new(),
            importances: Vec::new(),
            oob_mse: None,
            oob_r_squared: None,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn oob_mse(&self) -> Option<f64> {
        self.oob_mse
    }

    pub fn oob_r_squared(&self) -> Option<f64> {
        self.oob_r_squared
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    fn fit_impl(&mut self, data: &Dataset) -> Result<()> {
        if data.n_samples() == 0 {
            bail!("Cannot fit a forest on an empty dataset");
        }

        self.feature_names = data.feature_names.clone();
        let n_features = data.n_features();
        let max_features = self
            .params
            .max_features
            .unwrap_or((n_features / 3).max(1));

        let trees: Vec<RegressionTree> = (0..self.params.n_trees)
            .into_par_iter()
            .map(|i| {
                let tree_seed = self.params.seed.wrapping_add(i as u64);
                let bootstrap = data.bootstrap_indices(tree_seed);

                let mut tree = RegressionTree::new(TreeParams {
                    max_depth: self.params.max_depth,
                    min_samples_split: self.params.min_samples_split,
                    min_samples_leaf: self.params.min_samples_leaf,
                    max_features: Some(max_features),
                    seed: tree_seed,
                });
                tree.fit(&data.subset(&bootstrap));
                tree
            })
            .collect();
        self.trees = trees;

        let mut importances = vec![0.0; n_features];
        for tree in &self.trees {
            for (slot, imp) in importances.iter_mut().zip(tree.importances()) {
                *slot += imp;
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in &mut importances {
                *imp /= total;
            }
        }
        self.importances = importances;

        if self.params.compute_oob {
            self.score_out_of_bag(data);
        }

        Ok(())
    }

    /// Score each sample with the trees whose bootstrap never drew it
    fn score_out_of_bag(&mut self, data: &Dataset) {
        let n = data.n_samples();
        let mut sums = vec![0.0; n];
        let mut counts = vec![0usize; n];

        for (tree_idx, tree) in self.trees.iter().enumerate() {
            let tree_seed = self.params.seed.wrapping_add(tree_idx as u64);
            let mut in_bag = vec![false; n];
            for idx in data.bootstrap_indices(tree_seed) {
                in_bag[idx] = true;
            }

            for (i, bagged) in in_bag.iter().enumerate() {
                if !bagged {
                    sums[i] += tree.predict_row(&data.features[i]);
                    counts[i] += 1;
                }
            }
        }

        let mut sq_err = 0.0;
        let mut scored = 0usize;
        let mut scored_labels = Vec::new();
        for i in 0..n {
            if counts[i] > 0 {
                let pred = sums[i] / counts[i] as f64;
                sq_err += (pred - data.labels[i]).powi(2);
                scored += 1;
                scored_labels.push(data.labels[i]);
            }
        }

        if scored == 0 {
            return;
        }

        let mse = sq_err / scored as f64;
        self.oob_mse = Some(mse);

        let mean = scored_labels.iter().sum::<f64>() / scored as f64;
        let ss_tot: f64 = scored_labels.iter().map(|l| (l - mean).powi(2)).sum();
        if ss_tot > 0.0 {
            self.oob_r_squared = Some(1.0 - sq_err / ss_tot);
        }
    }
}

impl Regressor for RandomForest {
    fn fit(&mut self, data: &Dataset) -> Result<()> {
        self.fit_impl(data)
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.par_iter().map(|row| self.predict_row(row)).collect()
    }

    /// Normalized importances ranked descending
    fn feature_importances(&self) -> Vec<(String, f64)> {
        let mut ranking: Vec<(String, f64)> = self
            .feature_names
            .iter()
            .cloned()
            .zip(self.importances.iter().copied())
            .collect();
        ranking.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranking
    }
}
