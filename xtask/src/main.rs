// Tooling crate: documented through --help rather than rustdoc.
#![allow(missing_docs)]

mod check;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser};
use colored::Colorize;
use size_budget::config::{
    DEFAULT_FLASH_CAPACITY, DEFAULT_OBJDUMP, DEFAULT_RAM_CAPACITY, DEFAULT_STACK_RESERVE,
    DEFAULT_TABLE_SYMBOL,
};
use size_budget::Limits;
use tracing_subscriber::EnvFilter;

use crate::check::CheckConfig;

#[derive(Debug, Parser)]
#[command(name = "check")]
#[command(about = "Check AVR firmware section sizes against flash and SRAM budgets", long_about = None)]
#[command(version)]
struct Cli {
    /// Linked firmware image (ELF)
    artifact: PathBuf,
    /// Bytes of RAM reserved for the stack
    #[arg(default_value_t = DEFAULT_STACK_RESERVE)]
    stack_reserve: u64,
    /// Total program flash in bytes
    #[arg(default_value_t = DEFAULT_FLASH_CAPACITY)]
    flash_capacity: u64,
    /// Total SRAM in bytes
    #[arg(default_value_t = DEFAULT_RAM_CAPACITY)]
    ram_capacity: u64,
    /// Section/symbol dump tool, invoked as `<OBJDUMP> -ht <ARTIFACT>`
    #[arg(long, default_value = DEFAULT_OBJDUMP)]
    objdump: String,
    /// Lookup table that must not cross a 256-byte page boundary
    #[arg(long, default_value = DEFAULT_TABLE_SYMBOL)]
    table_symbol: String,
    /// Log more (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> CheckConfig {
        CheckConfig {
            artifact: self.artifact,
            limits: Limits::new(self.stack_reserve, self.flash_capacity, self.ram_capacity),
            objdump: self.objdump,
            table_symbol: self.table_symbol,
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match check::run(&cli.into_config()) {
        Ok(report) => ExitCode::from(report.exit_status()),
        Err(err) => {
            println!("{} {err:#}", "ERROR:".red().bold());
            ExitCode::from(check::EXIT_FATAL)
        }
    }
}
