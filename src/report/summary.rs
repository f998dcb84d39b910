//! Pipeline summary report generation

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::model::ModelEvaluation;
use crate::pipeline::{ColumnSummary, CorrelatedPair};

/// Summary of the full analysis run
#[derive(Debug, Default)]
pub struct PipelineSummary {
    pub datasets: usize,
    pub joined_rows: usize,
    pub initial_predictors: usize,
    pub final_predictors: usize,
    pub dropped_sparse: Vec<String>,
    pub dropped_collinear: Vec<String>,
    pub imputation_iterations: usize,
    pub evaluation: Option<ModelEvaluation>,
}

impl PipelineSummary {
    pub fn new(datasets: usize) -> Self {
        Self {
            datasets,
            ..Default::default()
        }
    }

    pub fn set_predictors(&mut self, initial: usize) {
        self.initial_predictors = initial;
        self.final_predictors = initial;
    }

    pub fn add_sparse_drops(&mut self, columns: Vec<String>) {
        self.final_predictors -= columns.len().min(self.final_predictors);
        self.dropped_sparse = columns;
    }

    pub fn add_collinear_drops(&mut self, columns: Vec<String>) {
        self.final_predictors -= columns.len().min(self.final_predictors);
        self.dropped_collinear = columns;
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").yellow(),
            style("PIPELINE SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Datasets Loaded"), Cell::new(self.datasets)]);
        table.add_row(vec![
            Cell::new("📅 Joined Yearly Rows"),
            Cell::new(self.joined_rows),
        ]);
        table.add_row(vec![
            Cell::new("📊 Candidate Predictors"),
            Cell::new(self.initial_predictors),
        ]);
        table.add_row(vec![
            Cell::new("🗑️  Dropped (Sparse)"),
            Cell::new(self.dropped_sparse.len()).fg(if self.dropped_sparse.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("🔗 Dropped (Collinear)"),
            Cell::new(self.dropped_collinear.len()).fg(if self.dropped_collinear.is_empty() {
                Color::White
            } else {
                Color::Red
            }),
        ]);
        table.add_row(vec![
            Cell::new("✅ Final Predictors"),
            Cell::new(self.final_predictors)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);
        table.add_row(vec![
            Cell::new("🔄 Imputation Sweeps"),
            Cell::new(self.imputation_iterations),
        ]);

        if let Some(eval) = &self.evaluation {
            table.add_row(vec![
                Cell::new("🎯 Test R²"),
                Cell::new(format!("{:.3}", eval.r_squared))
                    .fg(r_squared_color(eval.r_squared))
                    .add_attribute(Attribute::Bold),
            ]);
            table.add_row(vec![
                Cell::new("📏 Test RMSE"),
                Cell::new(format!("{:.2}", eval.rmse)),
            ]);
            if let Some(oob) = eval.oob_r_squared {
                table.add_row(vec![
                    Cell::new("🌲 OOB R²"),
                    Cell::new(format!("{:.3}", oob)),
                ]);
            }
        }

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        self.display_drops();

        if let Some(eval) = &self.evaluation {
            if let Some(caveat) = &eval.caveat {
                println!();
                println!("      {} {}", style("⚠").yellow(), style(caveat).yellow());
            }
        }
    }

    fn display_drops(&self) {
        if self.dropped_sparse.is_empty() && self.dropped_collinear.is_empty() {
            return;
        }

        println!();
        println!(
            "    {} {}",
            style("📝").yellow(),
            style("DROPPED COLUMNS").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());

        if !self.dropped_sparse.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Mostly Missing").yellow(),
                style(format!("({})", self.dropped_sparse.len())).dim()
            );
            for column in &self.dropped_sparse {
                println!("        {} {}", style("•").dim(), column);
            }
        }

        if !self.dropped_collinear.is_empty() {
            println!();
            println!(
                "      {} {}:",
                style("Collinear").yellow(),
                style(format!("({})", self.dropped_collinear.len())).dim()
            );
            for column in &self.dropped_collinear {
                println!("        {} {}", style("•").dim(), column);
            }
        }
    }
}

fn r_squared_color(r_squared: f64) -> Color {
    if r_squared > 0.8 {
        Color::Green
    } else if r_squared > 0.5 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Print the strongest correlated pairs as an indented table
pub fn print_pair_table(title: &str, pairs: &[CorrelatedPair], limit: usize) {
    println!();
    println!(
        "    {} {}",
        style("🔗").yellow(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    if pairs.is_empty() {
        println!("      {}", style("none").dim());
        return;
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Variable 1").add_attribute(Attribute::Bold),
        Cell::new("Variable 2").add_attribute(Attribute::Bold),
        Cell::new("r").add_attribute(Attribute::Bold),
    ]);

    for pair in pairs.iter().take(limit) {
        let color = if pair.correlation.abs() > 0.9 {
            Color::Red
        } else if pair.correlation.abs() > 0.75 {
            Color::Yellow
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(truncate(&pair.var1, 40)),
            Cell::new(truncate(&pair.var2, 40)),
            Cell::new(format!("{:+.3}", pair.correlation)).fg(color),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
    if pairs.len() > limit {
        println!(
            "      {}",
            style(format!("… and {} more", pairs.len() - limit)).dim()
        );
    }
}

/// Print per-column descriptive statistics as an indented table
pub fn print_stats_table(title: &str, summaries: &[ColumnSummary], limit: usize) {
    println!();
    println!(
        "    {} {}",
        style("📊").yellow(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Column").add_attribute(Attribute::Bold),
        Cell::new("Observed").add_attribute(Attribute::Bold),
        Cell::new("Missing %").add_attribute(Attribute::Bold),
        Cell::new("Mean").add_attribute(Attribute::Bold),
        Cell::new("Std").add_attribute(Attribute::Bold),
    ]);

    for summary in summaries.iter().take(limit) {
        let missing_pct = summary.missing_fraction * 100.0;
        let color = if missing_pct > 50.0 {
            Color::Red
        } else if missing_pct > 20.0 {
            Color::Yellow
        } else {
            Color::White
        };
        table.add_row(vec![
            Cell::new(truncate(&summary.name, 40)),
            Cell::new(summary.observed),
            Cell::new(format!("{:.1}", missing_pct)).fg(color),
            Cell::new(format_stat(summary.mean)),
            Cell::new(format_stat(summary.std)),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
    if summaries.len() > limit {
        println!(
            "      {}",
            style(format!("… and {} more", summaries.len() - limit)).dim()
        );
    }
}

/// Print the ranked feature importances
pub fn print_importance_table(importances: &[(String, f64)], limit: usize) {
    println!();
    println!(
        "    {} {}",
        style("🏆").yellow(),
        style("PREDICTOR IMPORTANCE").white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("#").add_attribute(Attribute::Bold),
        Cell::new("Predictor").add_attribute(Attribute::Bold),
        Cell::new("Importance").add_attribute(Attribute::Bold),
    ]);

    for (rank, (name, importance)) in importances.iter().take(limit).enumerate() {
        let color = if rank == 0 { Color::Green } else { Color::White };
        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(truncate(name, 50)).fg(color),
            Cell::new(format!("{:.4}", importance)).fg(color),
        ]);
    }

    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn truncate(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let cut: String = name.chars().take(max - 1).collect();
        format!("{}…", cut)
    }
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.abs() >= 1e6 => format!("{:.3e}", v),
        Some(v) => format!("{:.2}", v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_tracks_drops() {
        let mut summary = PipelineSummary::new(6);
        summary.set_predictors(20);
        summary.add_sparse_drops(vec!["a".to_string(), "b".to_string()]);
        summary.add_collinear_drops(vec!["c".to_string()]);

        assert_eq!(summary.initial_predictors, 20);
        assert_eq!(summary.final_predictors, 17);
    }

    #[test]
    fn test_truncate_keeps_short_names() {
        assert_eq!(truncate("gdp", 10), "gdp");
        assert_eq!(truncate("abcdefghijk", 5).chars().count(), 5);
    }
}
