//! Regression tree used as the Random Forest base learner

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::dataset::Dataset;

/// Growth limits for a single tree
#[derive(Debug, Clone)]
pub struct TreeParams {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Features considered per split (None = all)
    pub max_features: Option<usize>,
    pub seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 10,
            min_samples_split: 4,
            min_samples_leaf: 2,
            max_features: None,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

/// A fitted regression tree
#[derive(Debug, Clone)]
pub struct RegressionTree {
    params: TreeParams,
    root: Option<Node>,
    importances: Vec<f64>,
}

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            root: None,
            importances: Vec::new(),
        }
    }

    /// Grow the tree on the full dataset
    pub fn fit(&mut self, data: &Dataset) {
        let indices: Vec<usize> = (0..data.n_samples()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);
        let mut importances = vec![0.0; data.n_features()];

        self.root = Some(self.build(data, &indices, 0, &mut rng, &mut importances));
        self.importances = importances;
    }

    fn build(
        &self,
        data: &Dataset,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
        importances: &mut [f64],
    ) -> Node {
        let labels: Vec<f64> = indices.iter().map(|&i| data.labels[i]).collect();
        let impurity = variance(&labels);

        if depth >= self.params.max_depth
            || indices.len() < self.params.min_samples_split
            || impurity < 1e-12
        {
            return Node::Leaf {
                value: mean(&labels),
            };
        }

        match self.best_split(data, indices, impurity, rng) {
            Some((feature, threshold, left_idx, right_idx, gain)) => {
                if left_idx.len() < self.params.min_samples_leaf
                    || right_idx.len() < self.params.min_samples_leaf
                {
                    return Node::Leaf {
                        value: mean(&labels),
                    };
                }

                // Impurity decrease weighted by node size
                importances[feature] += gain * indices.len() as f64;

                let left = self.build(data, &left_idx, depth + 1, rng, importances);
                let right = self.build(data, &right_idx, depth + 1, rng, importances);

                Node::Split {
                    feature,
                    threshold,
                    left: Box::new(left),
                    right: Box::new(right),
                }
            }
            None => Node::Leaf {
                value: mean(&labels),
            },
        }
    }

    /// Best variance-reducing split over a random feature subset
    #[allow(clippy::type_complexity)]
    fn best_split(
        &self,
        data: &Dataset,
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> {
        let n_features = data.n_features();
        let max_features = self.params.max_features.unwrap_or(n_features).max(1);

        let mut candidates: Vec<usize> = (0..n_features).collect();
        candidates.shuffle(rng);
        candidates.truncate(max_features);
        candidates.sort_unstable();

        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> = None;
        let mut best_gain = 0.0;

        for &feature in &candidates {
            let mut values: Vec<f64> = indices.iter().map(|&i| data.features[i][feature]).collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| data.features[i][feature] <= threshold);

                if left_idx.is_empty() || right_idx.is_empty() {
                    continue;
                }

                let left_labels: Vec<f64> = left_idx.iter().map(|&i| data.labels[i]).collect();
                let right_labels: Vec<f64> = right_idx.iter().map(|&i| data.labels[i]).collect();

                let n_left = left_labels.len() as f64;
                let n_right = right_labels.len() as f64;
                let weighted = (n_left * variance(&left_labels)
                    + n_right * variance(&right_labels))
                    / (n_left + n_right);

                let gain = parent_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, threshold, left_idx, right_idx, gain));
                }
            }
        }

        best
    }

    /// Prediction for a single feature row
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node = match &self.root {
            Some(node) => node,
            None => return 0.0,
        };

        loop {
            match node {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    node = if row[*feature] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Raw (unnormalized) impurity-decrease importances
    pub fn importances(&self) -> &[f64] {
        &self.importances
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear_dataset(n: usize) -> Dataset {
        let mut data = Dataset::new(vec!["x".to_string()]);
        for i in 0..n {
            let x = i as f64 / 10.0;
            data.add_row(vec![x], 2.0 * x + 1.0);
        }
        data
    }

    #[test]
    fn test_tree_fits_linear_data() {
        let data = linear_dataset(100);
        let mut tree = RegressionTree::new(TreeParams::default());
        tree.fit(&data);

        // Deep enough tree approximates the line closely at the ends
        let low = tree.predict_row(&[0.5]);
        let high = tree.predict_row(&[9.0]);
        assert!(high > low, "predictions should increase with x");
        assert!((high - 19.0).abs() < 2.0, "high prediction off: {}", high);
    }

    #[test]
    fn test_tree_importances_cover_split_feature() {
        let mut data = Dataset::new(vec!["signal".to_string(), "noise".to_string()]);
        for i in 0..60 {
            let x = i as f64;
            data.add_row(vec![x, (i % 3) as f64], x);
        }

        let mut tree = RegressionTree::new(TreeParams::default());
        tree.fit(&data);

        let imp = tree.importances();
        assert!(
            imp[0] > imp[1],
            "signal feature should dominate importances: {:?}",
            imp
        );
    }
}
