//! Terminal styling utilities for the pipeline output

use console::{style, Emoji};
use std::path::Path;

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "");
pub static FOLDER: Emoji<'_, '_> = Emoji("📂 ", "");
pub static SAVE: Emoji<'_, '_> = Emoji("💾 ", "");
pub static LINK: Emoji<'_, '_> = Emoji("🔗 ", "");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     █████╗ ██╗   ██╗██████╗ ██╗ ██████╗
    ██╔══██╗██║   ██║██╔══██╗██║██╔════╝
    ███████║██║   ██║██████╔╝██║██║
    ██╔══██║██║   ██║██╔══██╗██║██║
    ██║  ██║╚██████╔╝██║  ██║██║╚██████╗
    ╚═╝  ╚═╝ ╚═════╝ ╚═╝  ╚═╝╚═╝ ╚═════╝
    "#;

    println!();
    println!("{}", style(banner).yellow().bold());
    println!(
        "    {} {}",
        style("Au").yellow().bold(),
        style("Gold prices against World Development Indicators").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print configuration card
pub fn print_config(
    data_dir: &Path,
    report: &Path,
    sparse_cutoff: f64,
    collinearity_cutoff: f64,
    seed: u64,
) {
    println!("    {}", style("Configuration").yellow().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!("      {} Data directory: {}", FOLDER, data_dir.display());
    println!("      {} Report file:    {}", SAVE, report.display());
    println!(
        "      {} Sparse column cutoff:  {}",
        CHART,
        style(format!("{:.2}", sparse_cutoff)).yellow()
    );
    println!(
        "      {} Collinearity cutoff:   {}",
        LINK,
        style(format!("{:.2}", collinearity_cutoff)).yellow()
    );
    println!("      {} Random seed:           {}", INFO, style(seed).yellow());
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).yellow().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!(
        "    {} {}",
        style("!").yellow().bold(),
        style(message).yellow()
    );
}

/// Print the final completion message
pub fn print_completion() {
    println!();
    println!(
        "    {} {}",
        ROCKET,
        style("Auric analysis complete!").green().bold()
    );
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize, threshold_info: Option<&str>) {
    if let Some(info) = threshold_info {
        println!(
            "      Found {} {} {}",
            style(count).yellow().bold(),
            description,
            style(info).dim()
        );
    } else {
        println!(
            "      Found {} {}",
            style(count).yellow().bold(),
            description
        );
    }
}

/// Print elapsed time for a pipeline step
pub fn print_step_time(elapsed: std::time::Duration) {
    println!(
        "      {}",
        style(format!("took {:.2}s", elapsed.as_secs_f64())).dim()
    );
}
