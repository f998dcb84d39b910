//! Model module - the trainable regression backend
//!
//! The pipeline only ever talks to a model through [`Regressor`]: fit,
//! predict, report importances. Any compliant regression backend can slot
//! in without touching pipeline code.

pub mod dataset;
pub mod forest;
pub mod train;
pub mod tree;

use anyhow::Result;

pub use dataset::{Dataset, Split};
pub use forest::{ForestParams, RandomForest};
pub use train::{stratified_split, train_and_evaluate, ModelEvaluation, TrainConfig};
pub use tree::{RegressionTree, TreeParams};

/// An opaque trainable regression model
pub trait Regressor {
    /// Fit the model to a dataset
    fn fit(&mut self, data: &Dataset) -> Result<()>;

    /// Predict the target for each feature row
    fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64>;

    /// Relative predictor contributions, ranked descending
    fn feature_importances(&self) -> Vec<(String, f64)>;
}
