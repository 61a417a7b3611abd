use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use folio_core::projection::{self, ProjectionInput};

use crate::input;

/// Arguments for a Monte Carlo horizon-value projection
#[derive(Args)]
pub struct ProjectArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Starting portfolio value
    #[arg(long)]
    pub initial_value: Option<Decimal>,

    /// Annual expected portfolio return (e.g. 0.12)
    #[arg(long, allow_hyphen_values = true)]
    pub expected_return: Option<Decimal>,

    /// Annual portfolio risk as a standard deviation (e.g. 0.18)
    #[arg(long)]
    pub risk: Option<Decimal>,

    /// Holding horizon in whole years
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Number of simulated paths
    #[arg(long, default_value = "10000")]
    pub simulations: u32,

    /// Seed for reproducible runs
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn run_project(args: ProjectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let proj_input: ProjectionInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let (
        Some(initial_value),
        Some(expected_return),
        Some(portfolio_risk),
        Some(horizon_years),
    ) = (args.initial_value, args.expected_return, args.risk, args.horizon)
    {
        ProjectionInput {
            initial_value,
            expected_return,
            portfolio_risk,
            horizon_years,
            num_simulations: args.simulations,
            seed: args.seed,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "Provide --initial-value, --expected-return, --risk and --horizon, --input <file.json>, or stdin"
                .into(),
        );
    };

    let result = projection::project_portfolio_value(&proj_input)?;
    Ok(serde_json::to_value(result)?)
}
