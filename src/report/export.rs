//! JSON export of the full analysis run
//!
//! Produces a single machine-readable report documenting every stage of
//! the pipeline, from raw dataset shapes through correlation screening to
//! the fitted model's metrics and importances.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::model::ModelEvaluation;
use crate::pipeline::{ColumnSummary, CorrelatedPair, OobError};

/// Thresholds used in the analysis
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdsConfig {
    pub sparse_ratio: f64,
    pub band_low: f64,
    pub band_high: f64,
    pub collinearity: f64,
}

/// Metadata about the analysis run
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    pub auric_version: String,
    pub data_dir: String,
    pub thresholds: ThresholdsConfig,
    pub trees: usize,
    pub seed: u64,
}

/// Shape of one raw dataset as loaded
#[derive(Debug, Clone, Serialize)]
pub struct DatasetEntry {
    pub name: String,
    pub rows: usize,
    pub columns: usize,
    pub missing_ratio: f64,
}

/// One imputed variable's diagnostic
#[derive(Debug, Clone, Serialize)]
pub struct ImputationExport {
    pub iterations: usize,
    pub oob_errors: Vec<OobError>,
}

/// Ranked importance of one predictor
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceEntry {
    pub predictor: String,
    pub importance: f64,
}

/// Fitted model metrics
#[derive(Debug, Clone, Serialize)]
pub struct ModelExport {
    pub r_squared: f64,
    pub rmse: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oob_r_squared: Option<f64>,
    pub cv_rmse: f64,
    pub chosen_max_features: usize,
    pub train_rows: usize,
    pub test_rows: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
    pub importances: Vec<ImportanceEntry>,
}

impl From<&ModelEvaluation> for ModelExport {
    fn from(eval: &ModelEvaluation) -> Self {
        Self {
            r_squared: eval.r_squared,
            rmse: eval.rmse,
            oob_r_squared: eval.oob_r_squared,
            cv_rmse: eval.cv_rmse,
            chosen_max_features: eval.chosen_max_features,
            train_rows: eval.train_rows,
            test_rows: eval.test_rows,
            caveat: eval.caveat.clone(),
            importances: eval
                .importances
                .iter()
                .map(|(predictor, importance)| ImportanceEntry {
                    predictor: predictor.clone(),
                    importance: *importance,
                })
                .collect(),
        }
    }
}

/// Stage timing in milliseconds
#[derive(Debug, Clone, Default, Serialize)]
pub struct TimingInfo {
    pub load_ms: u64,
    pub normalize_ms: u64,
    pub summary_ms: u64,
    pub correlation_ms: u64,
    pub join_ms: u64,
    pub collinearity_ms: u64,
    pub impute_ms: u64,
    pub train_ms: u64,
    pub total_ms: u64,
}

/// Complete analysis report
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metadata: ReportMetadata,
    pub datasets: Vec<DatasetEntry>,
    pub column_summaries: Vec<ColumnSummary>,
    pub dropped_sparse: Vec<String>,
    /// Indicator pairs in the moderate-to-strong band
    pub overview_pairs: Vec<CorrelatedPair>,
    /// Variables correlated with the yearly gold price
    pub gold_pairs: Vec<CorrelatedPair>,
    pub dropped_collinear: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imputation: Option<ImputationExport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelExport>,
    pub timing: TimingInfo,
}

/// Parameters for creating an [`AnalysisReportBuilder`]
pub struct ReportParams {
    pub data_dir: String,
    pub sparse_ratio: f64,
    pub band_low: f64,
    pub band_high: f64,
    pub collinearity: f64,
    pub trees: usize,
    pub seed: u64,
}

/// Accumulates stage results during pipeline execution
pub struct AnalysisReportBuilder {
    params: ReportParams,
    datasets: Vec<DatasetEntry>,
    column_summaries: Vec<ColumnSummary>,
    dropped_sparse: Vec<String>,
    overview_pairs: Vec<CorrelatedPair>,
    gold_pairs: Vec<CorrelatedPair>,
    dropped_collinear: Vec<String>,
    imputation: Option<ImputationExport>,
    model: Option<ModelExport>,
    timing: TimingInfo,
}

impl AnalysisReportBuilder {
    pub fn new(params: ReportParams) -> Self {
        Self {
            params,
            datasets: Vec::new(),
            column_summaries: Vec::new(),
            dropped_sparse: Vec::new(),
            overview_pairs: Vec::new(),
            gold_pairs: Vec::new(),
            dropped_collinear: Vec::new(),
            imputation: None,
            model: None,
            timing: TimingInfo::default(),
        }
    }

    pub fn add_dataset(&mut self, name: &str, rows: usize, columns: usize, missing_ratio: f64) {
        self.datasets.push(DatasetEntry {
            name: name.to_string(),
            rows,
            columns,
            missing_ratio,
        });
    }

    pub fn set_column_summaries(&mut self, summaries: Vec<ColumnSummary>) {
        self.column_summaries = summaries;
    }

    pub fn set_sparse_drops(&mut self, dropped: Vec<String>) {
        self.dropped_sparse = dropped;
    }

    pub fn set_overview_pairs(&mut self, pairs: Vec<CorrelatedPair>) {
        self.overview_pairs = pairs;
    }

    pub fn set_gold_pairs(&mut self, pairs: Vec<CorrelatedPair>) {
        self.gold_pairs = pairs;
    }

    pub fn set_collinear_drops(&mut self, dropped: Vec<String>) {
        self.dropped_collinear = dropped;
    }

    pub fn set_imputation(&mut self, iterations: usize, oob_errors: Vec<OobError>) {
        self.imputation = Some(ImputationExport {
            iterations,
            oob_errors,
        });
    }

    pub fn set_model(&mut self, evaluation: &ModelEvaluation) {
        self.model = Some(ModelExport::from(evaluation));
    }

    pub fn set_timing(&mut self, timing: TimingInfo) {
        self.timing = timing;
    }

    pub fn build(self) -> AnalysisReport {
        AnalysisReport {
            metadata: ReportMetadata {
                timestamp: Utc::now().to_rfc3339(),
                auric_version: env!("CARGO_PKG_VERSION").to_string(),
                data_dir: self.params.data_dir,
                thresholds: ThresholdsConfig {
                    sparse_ratio: self.params.sparse_ratio,
                    band_low: self.params.band_low,
                    band_high: self.params.band_high,
                    collinearity: self.params.collinearity,
                },
                trees: self.params.trees,
                seed: self.params.seed,
            },
            datasets: self.datasets,
            column_summaries: self.column_summaries,
            dropped_sparse: self.dropped_sparse,
            overview_pairs: self.overview_pairs,
            gold_pairs: self.gold_pairs,
            dropped_collinear: self.dropped_collinear,
            imputation: self.imputation,
            model: self.model,
            timing: self.timing,
        }
    }
}

/// Export the analysis report to a JSON file
pub fn export_analysis_report(report: &AnalysisReport, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)
        .context("Failed to serialize analysis report to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write analysis report to {}", output_path.display()))?;

    Ok(())
}
