mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::allocation::AllocateArgs;
use commands::construction::{BuildArgs, EstimateArgs};
use commands::profile::ClassifyArgs;
use commands::projection::ProjectArgs;

/// Whole-share portfolio construction from a shortlist of instruments
#[derive(Parser)]
#[command(
    name = "folio",
    version,
    about = "Whole-share portfolio construction from a shortlist of instruments",
    long_about = "A CLI that ranks a shortlist of instruments by estimated forward return, \
                  weights the top holdings with three strategies (minimum variance, \
                  return weighted, risk parity), converts the weights into whole shares \
                  and reports return, risk, Sharpe ratio, VaR and sector exposure."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log pipeline stages to stderr (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the minimum-variance, return-weighted and risk-parity portfolios
    Build(BuildArgs),
    /// Rank every eligible instrument by estimated annual return
    Estimate(EstimateArgs),
    /// Convert target weights into whole shares
    Allocate(AllocateArgs),
    /// Classify an investor as Aggressive, Conservative or Moderate
    Classify(ClassifyArgs),
    /// Monte Carlo projection of a portfolio's horizon value
    Project(ProjectArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Build(args) => commands::construction::run_build(args),
        Commands::Estimate(args) => commands::construction::run_estimate(args),
        Commands::Allocate(args) => commands::allocation::run_allocate(args),
        Commands::Classify(args) => commands::profile::run_classify(args),
        Commands::Project(args) => commands::projection::run_project(args),
        Commands::Version => {
            println!("folio {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
