use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::Value;

use folio_core::construction::engine::{self, ConstructionInput};
use folio_core::estimation::returns::{self, ReturnEstimationInput};
use folio_core::strategies::StrategySet;

use crate::commands::profile::ProfileArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategySetArg {
    /// Equal-weight placeholders plus return weighting
    Compatible,
    /// Long-only minimum variance and hierarchical risk parity solvers
    Optimized,
}

impl From<StrategySetArg> for StrategySet {
    fn from(arg: StrategySetArg) -> Self {
        match arg {
            StrategySetArg::Compatible => StrategySet::Compatible,
            StrategySetArg::Optimized => StrategySet::Optimized,
        }
    }
}

/// Arguments for building the three candidate portfolios
#[derive(Args)]
pub struct BuildArgs {
    /// Path to a full construction input (.json, .yaml or .yml)
    #[arg(long, conflicts_with = "universe")]
    pub input: Option<String>,

    /// Path to the shortlist CSV (Sector, Ticker, Current Price, Std Dev (%), YYYY-MM...)
    #[arg(long)]
    pub universe: Option<String>,

    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Annual risk-free rate for the Sharpe ratio
    #[arg(long, default_value = "0.0698")]
    pub risk_free_rate: Decimal,

    /// Number of top-ranked instruments to hold
    #[arg(long, default_value_t = engine::DEFAULT_MAX_HOLDINGS)]
    pub max_holdings: usize,

    /// Value-at-Risk confidence level
    #[arg(long, default_value = "0.95")]
    pub confidence: Decimal,

    /// Strategy implementations to run
    #[arg(long, value_enum, default_value_t = StrategySetArg::Compatible)]
    pub strategy_set: StrategySetArg,
}

/// Arguments for listing ranked return estimates
#[derive(Args)]
pub struct EstimateArgs {
    /// Path to the shortlist CSV
    #[arg(long, conflicts_with = "input")]
    pub universe: Option<String>,

    /// Path to a JSON estimation input
    #[arg(long)]
    pub input: Option<String>,

    /// Holding horizon in whole years
    #[arg(long, default_value = "1")]
    pub horizon: u32,
}

pub fn run_build(args: BuildArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut rejected_rows = 0usize;

    let construction_input: ConstructionInput = if let Some(ref path) = args.input {
        input::file::read_structured(path)?
    } else if let Some(ref path) = args.universe {
        let loaded = input::universe::load_universe(path)?;
        rejected_rows = loaded.rejected_rows;
        let profile = match args.profile.resolve()? {
            Some(p) => p,
            None => match input::stdin::read_stdin()? {
                Some(data) => serde_json::from_value(data)?,
                None => {
                    return Err(
                        "Provide --profile <file>, the profile flags, or pipe a profile via stdin"
                            .into(),
                    )
                }
            },
        };
        ConstructionInput {
            instruments: loaded.instruments,
            profile,
            risk_free_rate: args.risk_free_rate,
            max_holdings: args.max_holdings,
            confidence_level: args.confidence,
            strategy_set: args.strategy_set.into(),
        }
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--universe <file.csv>, --input <file> or stdin required".into());
    };

    let mut result = engine::generate_portfolios(&construction_input)?;
    if rejected_rows > 0 {
        tracing::warn!(rejected_rows, "shortlist rows rejected while loading");
        result.warnings.insert(
            0,
            format!("{rejected_rows} shortlist row(s) rejected for a missing ticker or non-numeric price/std dev"),
        );
    }
    Ok(serde_json::to_value(result)?)
}

pub fn run_estimate(args: EstimateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let estimation_input: ReturnEstimationInput = if let Some(ref path) = args.universe {
        let loaded = input::universe::load_universe(path)?;
        ReturnEstimationInput {
            instruments: loaded.instruments,
            horizon_years: args.horizon,
        }
    } else if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--universe <file.csv>, --input <file.json> or stdin required".into());
    };

    let result = returns::estimate_universe(&estimation_input)?;
    Ok(serde_json::to_value(result)?)
}
