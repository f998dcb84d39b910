//! Auric: gold price driver analysis
//!
//! Loads six macroeconomic datasets, normalizes them into tidy tables,
//! screens indicator correlations, joins everything into one row per year,
//! reduces collinear predictors, imputes the remaining gaps and fits a
//! Random Forest explaining the annual gold price.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;

use auric::cli::Cli;
use auric::model::{train_and_evaluate, Dataset, TrainConfig};
use auric::pipeline::{
    dataset_stats, drop_sparse_columns, impute_random_forest, join_yearly, load_sources,
    missing_ratios, summarize_columns, tidy_bitcoin, tidy_currency, tidy_gold, tidy_index,
    tidy_indicators, world_indicators, yearly_gold, yearly_index, CorrelationMatrix, ImputeConfig,
    select_redundant, GOLD_COLUMN,
};
use auric::report::{
    export_analysis_report, print_importance_table, print_pair_table, print_stats_table,
    AnalysisReportBuilder, PipelineSummary, ReportParams, TimingInfo,
};
use auric::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    let report_path = cli.report_path();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(
        &cli.data_dir,
        &report_path,
        cli.sparse_threshold,
        cli.collinearity_threshold,
        cli.seed,
    );

    let run_start = Instant::now();
    let mut timing = TimingInfo::default();
    let mut builder = AnalysisReportBuilder::new(ReportParams {
        data_dir: cli.data_dir.display().to_string(),
        sparse_ratio: cli.sparse_threshold,
        band_low: cli.band_low,
        band_high: cli.band_high,
        collinearity: cli.collinearity_threshold,
        trees: cli.trees,
        seed: cli.seed,
    });

    // Step 1: Load the raw datasets
    print_step_header(1, "Load Datasets");

    let step_start = Instant::now();
    let spinner = create_spinner("Reading CSV sources...");
    let raw = load_sources(&cli.source_paths())?;
    finish_with_success(&spinner, "All sources loaded and schema-checked");

    let mut summary = PipelineSummary::new(6);
    for (name, df) in [
        ("world_development_indicators", &raw.indicators),
        ("currency_exchange_rates", &raw.currency),
        ("gold_prices", &raw.gold),
        ("sp_composite", &raw.index),
        ("bitcoin_market_price", &raw.bitcoin.market_price),
        ("bitcoin_total_supply", &raw.bitcoin.total_supply),
        ("bitcoin_market_cap", &raw.bitcoin.market_cap),
        ("bitcoin_trade_volume", &raw.bitcoin.trade_volume),
    ] {
        let (rows, cols, memory_mb) = dataset_stats(df);
        let ratios = missing_ratios(df);
        let overall = if ratios.is_empty() {
            0.0
        } else {
            ratios.iter().map(|(_, r)| r).sum::<f64>() / ratios.len() as f64
        };
        builder.add_dataset(name, rows, cols, overall);
        println!(
            "      {} {} rows x {} cols ({:.1} MB)",
            style(name).dim(),
            style(rows).yellow(),
            style(cols).yellow(),
            memory_mb
        );
    }
    timing.load_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 2: Normalize into tidy tables
    print_step_header(2, "Normalize Tables");

    let step_start = Instant::now();
    let spinner = create_spinner("Reshaping raw tables...");
    let indicators = tidy_indicators(&raw.indicators)?;
    let currency = tidy_currency(&raw.currency)?;
    let gold = tidy_gold(&raw.gold)?;
    let index = tidy_index(&raw.index)?;
    let bitcoin = tidy_bitcoin(&raw.bitcoin)?;
    finish_with_success(&spinner, "Tables normalized");

    print_count("indicator (country, year) rows", indicators.height(), None);
    print_count("currency observations", currency.height(), None);
    print_count("bitcoin dates", bitcoin.height(), None);
    // Rate directionality is inconsistent in the raw currency data, so it
    // stays out of every later stage
    print_info("Currency rates are summarized only, not analyzed");
    timing.normalize_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 3: Descriptive statistics and sparse-column filtering
    print_step_header(3, "Descriptive Statistics");

    let step_start = Instant::now();
    let initial_predictors = indicators
        .get_columns()
        .iter()
        .filter(|c| c.dtype().is_primitive_numeric() && c.name().as_str() != "year")
        .count();
    summary.set_predictors(initial_predictors);

    let indicator_stats = summarize_columns(&indicators)?;
    print_stats_table(
        "MOST INCOMPLETE INDICATORS",
        &sorted_by_missing(&indicator_stats),
        10,
    );

    // Completeness is judged over every (country, year) row; the World
    // restriction happens later, at the yearly join
    let (indicators, dropped_sparse) =
        drop_sparse_columns(&indicators, cli.sparse_threshold, &["country", "year"])?;
    if dropped_sparse.is_empty() {
        print_info("No indicator columns exceed the sparse cutoff");
    } else {
        print_count(
            "indicator column(s) dropped as mostly missing",
            dropped_sparse.len(),
            Some(&format!("(>={:.0}%)", cli.sparse_threshold * 100.0)),
        );
    }
    builder.set_sparse_drops(dropped_sparse.clone());
    summary.add_sparse_drops(dropped_sparse);
    timing.summary_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 4: Indicator correlation screen
    print_step_header(4, "Correlation Screen");

    let step_start = Instant::now();
    let spinner = create_spinner("Computing pairwise-complete correlations...");
    let indicator_matrix = CorrelationMatrix::compute(&indicators, &["year"])?;
    let overview_pairs = indicator_matrix.band_pairs(cli.band_low, cli.band_high);
    finish_with_success(&spinner, "Correlation matrix computed");

    print_count(
        "indicator pair(s) in the overview band",
        overview_pairs.len(),
        Some(&format!("({:.1} < |r| < {:.1})", cli.band_low, cli.band_high)),
    );
    print_pair_table("STRONGEST INDICATOR PAIRS", &overview_pairs, 10);
    builder.set_overview_pairs(overview_pairs);
    timing.correlation_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 5: Yearly cross-dataset join
    print_step_header(5, "Yearly Join");

    let step_start = Instant::now();
    let world = world_indicators(&indicators)?;
    let gold_yearly = yearly_gold(&gold)?;
    let index_yearly = yearly_index(&index)?;
    let joined = join_yearly(&world, &gold_yearly, &index_yearly)?;
    summary.joined_rows = joined.height();
    print_count("joined yearly rows", joined.height(), None);

    let joined_summaries = summarize_columns(&joined)?;
    builder.set_column_summaries(joined_summaries);

    let joined_matrix = CorrelationMatrix::compute(&joined, &["year"])?;
    let gold_pairs = joined_matrix.target_pairs(GOLD_COLUMN, cli.band_low);
    print_pair_table("CORRELATED WITH GOLD PRICE", &gold_pairs, 10);
    builder.set_gold_pairs(gold_pairs);
    timing.join_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 6: Collinearity reduction
    print_step_header(6, "Collinearity Reduction");

    let step_start = Instant::now();
    let spinner = create_spinner("Searching for redundant predictors...");
    // The target and the year key are never candidates for removal
    let predictor_matrix = CorrelationMatrix::compute(&joined, &["year", GOLD_COLUMN])?;
    let redundant = select_redundant(&predictor_matrix, cli.collinearity_threshold);
    finish_with_success(&spinner, "Redundancy search complete");

    let reduced = if redundant.is_empty() {
        print_info("No predictor pair exceeds the collinearity cutoff");
        joined
    } else {
        print_count(
            "redundant predictor(s)",
            redundant.len(),
            Some(&format!("(|r| > {:.2})", cli.collinearity_threshold)),
        );
        joined.drop_many(redundant.iter().map(|s| s.as_str()))
    };
    builder.set_collinear_drops(redundant.clone());
    summary.add_collinear_drops(redundant);
    timing.collinearity_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 7: Random Forest imputation
    print_step_header(7, "Missing Value Imputation");

    let step_start = Instant::now();
    let spinner = create_spinner("Imputing remaining gaps...");
    let imputed = impute_random_forest(
        &reduced,
        &ImputeConfig {
            max_iterations: cli.impute_iterations,
            n_trees: cli.impute_trees,
            seed: cli.seed,
        },
    )?;
    finish_with_success(&spinner, "Imputation converged");

    if imputed.iterations == 0 {
        print_info("No missing cells, imputation skipped");
    } else {
        print_count("imputation sweep(s)", imputed.iterations, None);
        for error in &imputed.oob_errors {
            println!(
                "      {} {} NRMSE {:.3}",
                style("•").dim(),
                error.variable,
                error.nrmse
            );
        }
    }
    summary.imputation_iterations = imputed.iterations;
    builder.set_imputation(imputed.iterations, imputed.oob_errors.clone());
    timing.impute_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Step 8: Model training and evaluation
    print_step_header(8, "Model Training");

    let step_start = Instant::now();
    let table = imputed.table;

    // Predictors are the variables meaningfully correlated with the gold
    // price; with nothing above the band floor, fall back to the full
    // reduced set
    let complete_matrix = CorrelationMatrix::compute(&table, &["year"])?;
    let chosen: Vec<String> = complete_matrix
        .target_pairs(GOLD_COLUMN, cli.band_low)
        .into_iter()
        .map(|p| {
            if p.var1 == GOLD_COLUMN {
                p.var2
            } else {
                p.var1
            }
        })
        .collect();

    let excluded: Vec<String> = table
        .get_columns()
        .iter()
        .filter(|c| {
            let name = c.name().as_str();
            name == "year"
                || (!chosen.is_empty() && name != GOLD_COLUMN && !chosen.iter().any(|v| v == name))
        })
        .map(|c| c.name().to_string())
        .collect();
    let excluded_refs: Vec<&str> = excluded.iter().map(|s| s.as_str()).collect();

    if chosen.is_empty() {
        print_warning("No predictor clears the correlation floor, using all");
    } else {
        print_count("gold-correlated predictor(s)", chosen.len(), None);
    }

    let data = Dataset::from_dataframe(&table, GOLD_COLUMN, &excluded_refs)?;
    let spinner = create_spinner("Cross-validating and fitting the forest...");
    let (_, evaluation) = train_and_evaluate(
        &data,
        &TrainConfig {
            n_trees: cli.trees,
            seed: cli.seed,
            ..Default::default()
        },
    )?;
    finish_with_success(&spinner, "Model fitted");

    print_success(&format!(
        "Test R² {:.3}, RMSE {:.2} ({} train / {} test rows)",
        evaluation.r_squared, evaluation.rmse, evaluation.train_rows, evaluation.test_rows
    ));
    print_importance_table(&evaluation.importances, 10);
    builder.set_model(&evaluation);
    summary.evaluation = Some(evaluation);
    timing.train_ms = step_start.elapsed().as_millis() as u64;
    print_step_time(step_start.elapsed());

    // Export the JSON report and show the summary card
    timing.total_ms = run_start.elapsed().as_millis() as u64;
    builder.set_timing(timing);
    export_analysis_report(&builder.build(), &report_path)?;
    print_success(&format!("Report written to {}", report_path.display()));

    summary.display();
    print_completion();

    Ok(())
}

/// Column summaries reordered by descending missing fraction
fn sorted_by_missing(
    summaries: &[auric::pipeline::ColumnSummary],
) -> Vec<auric::pipeline::ColumnSummary> {
    let mut sorted = summaries.to_vec();
    sorted.sort_by(|a, b| {
        b.missing_fraction
            .partial_cmp(&a.missing_fraction)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted
}
