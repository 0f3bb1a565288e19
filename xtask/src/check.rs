use anyhow::{Context, Result};
use colored::Colorize;
use size_budget::{budget, objdump, Limits, Report};
use std::path::PathBuf;
use std::time::Instant;

/// Exit status when the image could not be inspected at all.
pub const EXIT_FATAL: u8 = 2;

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    pub artifact: PathBuf,
    pub limits: Limits,
    pub objdump: String,
    pub table_symbol: String,
}

pub fn run(config: &CheckConfig) -> Result<Report> {
    let start = Instant::now();

    let layout = objdump::inspect(&config.objdump, &config.artifact, &config.table_symbol)
        .with_context(|| format!("Failed to inspect {}", config.artifact.display()))?;

    let report = budget::evaluate(&layout, &config.limits, &config.table_symbol);
    print_report(&report);

    tracing::info!(
        passed = report.passed(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "size check finished"
    );

    Ok(report)
}

fn print_report(report: &Report) {
    println!("{}", report.sizes);
    for violation in &report.violations {
        println!("{} {}", "ERROR:".red().bold(), violation);
    }
}
