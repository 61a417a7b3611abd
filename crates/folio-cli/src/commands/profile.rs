use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use folio_core::profile::{classify_investor, Objective, RiskProfile};

use crate::input;

/// Risk profile from a file or from individual flags
#[derive(Args, Clone)]
pub struct ProfileArgs {
    /// Path to a risk profile (.json, .yaml or .yml)
    #[arg(long)]
    pub profile: Option<String>,

    /// Capital to invest
    #[arg(long)]
    pub amount: Option<Decimal>,

    /// Holding horizon in whole years
    #[arg(long)]
    pub horizon: Option<u32>,

    /// Risk tolerance as a fraction (0 to 0.2)
    #[arg(long)]
    pub risk_tolerance: Option<Decimal>,

    /// Investment objective: growth, income, balanced
    #[arg(long)]
    pub objective: Option<Objective>,
}

impl ProfileArgs {
    pub fn has_flags(&self) -> bool {
        self.amount.is_some()
            || self.horizon.is_some()
            || self.risk_tolerance.is_some()
            || self.objective.is_some()
    }

    /// Build the profile from `--profile` or from the individual flags.
    /// Returns `None` when neither was given.
    pub fn resolve(&self) -> Result<Option<RiskProfile>, Box<dyn std::error::Error>> {
        if let Some(ref path) = self.profile {
            let profile: RiskProfile = input::file::read_structured(path)?;
            return Ok(Some(profile));
        }
        if !self.has_flags() {
            return Ok(None);
        }

        let mut missing = Vec::new();
        if self.amount.is_none() {
            missing.push("--amount");
        }
        if self.horizon.is_none() {
            missing.push("--horizon");
        }
        if self.risk_tolerance.is_none() {
            missing.push("--risk-tolerance");
        }
        if self.objective.is_none() {
            missing.push("--objective");
        }
        match (self.amount, self.horizon, self.risk_tolerance, self.objective) {
            (
                Some(investment_amount),
                Some(horizon_years),
                Some(risk_tolerance),
                Some(objective),
            ) => Ok(Some(RiskProfile {
                investment_amount,
                horizon_years,
                risk_tolerance,
                objective,
            })),
            _ => Err(format!("Incomplete risk profile, missing {}", missing.join(", ")).into()),
        }
    }
}

/// Arguments for investor classification
#[derive(Args)]
pub struct ClassifyArgs {
    /// Holding horizon in whole years
    #[arg(long)]
    pub horizon: u32,

    /// Risk tolerance as a fraction (0 to 0.2)
    #[arg(long)]
    pub risk_tolerance: Decimal,

    /// Investment objective: growth, income, balanced
    #[arg(long)]
    pub objective: Objective,
}

pub fn run_classify(args: ClassifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let archetype = classify_investor(args.horizon, args.risk_tolerance, args.objective);
    Ok(serde_json::json!({
        "label": archetype.label(),
        "archetype": archetype,
        "horizon_years": args.horizon,
        "risk_tolerance": args.risk_tolerance,
        "objective": args.objective,
    }))
}
