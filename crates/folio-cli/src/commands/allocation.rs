use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use folio_core::allocation::shares::{self, AllocationInput};

use crate::input;

/// Arguments for whole-share allocation
#[derive(Args)]
pub struct AllocateArgs {
    /// Path to JSON input file
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated target weights (e.g. "0.5,0.3,0.2")
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<Decimal>>,

    /// Comma-separated share prices, same order as the weights
    #[arg(long, value_delimiter = ',')]
    pub prices: Option<Vec<Decimal>>,

    /// Capital to deploy
    #[arg(long)]
    pub capital: Option<Decimal>,
}

pub fn run_allocate(args: AllocateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let alloc_input: AllocationInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let (Some(weights), Some(prices), Some(capital)) =
        (args.weights, args.prices, args.capital)
    {
        AllocationInput {
            weights,
            prices,
            capital,
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("Provide --weights, --prices and --capital, --input <file.json>, or stdin".into());
    };

    let result = shares::calculate_allocation(&alloc_input)?;
    Ok(serde_json::to_value(result)?)
}
