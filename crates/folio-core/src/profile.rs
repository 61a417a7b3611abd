use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FolioError;
use crate::types::*;
use crate::FolioResult;

/// Highest risk tolerance the profiling flow offers (20%).
pub const MAX_RISK_TOLERANCE: Rate = dec!(0.20);

const AGGRESSIVE_MIN_TOLERANCE: Rate = dec!(0.08);
const AGGRESSIVE_MIN_HORIZON: Years = 4;
const CONSERVATIVE_MAX_TOLERANCE: Rate = dec!(0.05);
const CONSERVATIVE_MAX_HORIZON: Years = 2;

/// Investment objective. Accepts the legacy numeric codes "1"/"2"/"3".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    #[serde(alias = "Growth", alias = "1")]
    Growth,
    #[serde(alias = "Income", alias = "2")]
    Income,
    #[serde(alias = "Balanced", alias = "3")]
    Balanced,
}

impl FromStr for Objective {
    type Err = FolioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "growth" | "1" => Ok(Objective::Growth),
            "income" | "2" => Ok(Objective::Income),
            "balanced" | "3" => Ok(Objective::Balanced),
            other => Err(FolioError::InvalidInput {
                field: "objective".into(),
                reason: format!("Unknown objective '{other}'. Use: growth, income, balanced"),
            }),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Objective::Growth => "Growth",
            Objective::Income => "Income",
            Objective::Balanced => "Balanced",
        };
        f.write_str(s)
    }
}

/// Display-only investor label derived from the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestorArchetype {
    Aggressive,
    Conservative,
    Moderate,
}

impl InvestorArchetype {
    pub fn label(&self) -> &'static str {
        match self {
            InvestorArchetype::Aggressive => "Aggressive Investor",
            InvestorArchetype::Conservative => "Conservative Investor",
            InvestorArchetype::Moderate => "Moderate Investor",
        }
    }
}

/// Session risk profile. Read-only to the construction engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Capital to deploy (currency-agnostic)
    pub investment_amount: Money,
    /// Holding horizon in whole years (>= 1)
    #[serde(alias = "holding_period")]
    pub horizon_years: Years,
    /// Risk tolerance as a fraction between 0.0 and 0.2
    pub risk_tolerance: Rate,
    pub objective: Objective,
}

impl RiskProfile {
    pub fn validate(&self) -> FolioResult<()> {
        if self.investment_amount <= Decimal::ZERO {
            return Err(FolioError::InvalidInput {
                field: "investment_amount".into(),
                reason: "Must be positive".into(),
            });
        }
        if self.horizon_years < 1 {
            return Err(FolioError::InvalidInput {
                field: "horizon_years".into(),
                reason: "Holding horizon must be at least 1 year".into(),
            });
        }
        if self.risk_tolerance < Decimal::ZERO || self.risk_tolerance > MAX_RISK_TOLERANCE {
            return Err(FolioError::InvalidInput {
                field: "risk_tolerance".into(),
                reason: format!("Must be between 0 and {MAX_RISK_TOLERANCE}"),
            });
        }
        Ok(())
    }

    pub fn archetype(&self) -> InvestorArchetype {
        classify_investor(self.horizon_years, self.risk_tolerance, self.objective)
    }
}

/// Three-rule investor classifier.
///
/// Aggressive: tolerance >= 8%, horizon >= 4 years, growth objective.
/// Conservative: tolerance <= 5%, horizon <= 2 years, income objective.
/// Everything else is Moderate.
pub fn classify_investor(
    horizon_years: Years,
    risk_tolerance: Rate,
    objective: Objective,
) -> InvestorArchetype {
    if risk_tolerance >= AGGRESSIVE_MIN_TOLERANCE
        && horizon_years >= AGGRESSIVE_MIN_HORIZON
        && objective == Objective::Growth
    {
        InvestorArchetype::Aggressive
    } else if risk_tolerance <= CONSERVATIVE_MAX_TOLERANCE
        && horizon_years <= CONSERVATIVE_MAX_HORIZON
        && objective == Objective::Income
    {
        InvestorArchetype::Conservative
    } else {
        InvestorArchetype::Moderate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> RiskProfile {
        RiskProfile {
            investment_amount: dec!(100000),
            horizon_years: 3,
            risk_tolerance: dec!(0.08),
            objective: Objective::Balanced,
        }
    }

    #[test]
    fn test_aggressive_boundary() {
        assert_eq!(
            classify_investor(4, dec!(0.08), Objective::Growth),
            InvestorArchetype::Aggressive
        );
        assert_eq!(
            classify_investor(3, dec!(0.20), Objective::Growth),
            InvestorArchetype::Moderate
        );
        assert_eq!(
            classify_investor(5, dec!(0.07), Objective::Growth),
            InvestorArchetype::Moderate
        );
    }

    #[test]
    fn test_conservative_boundary() {
        assert_eq!(
            classify_investor(2, dec!(0.05), Objective::Income),
            InvestorArchetype::Conservative
        );
        assert_eq!(
            classify_investor(1, dec!(0.00), Objective::Income),
            InvestorArchetype::Conservative
        );
        assert_eq!(
            classify_investor(2, dec!(0.05), Objective::Balanced),
            InvestorArchetype::Moderate
        );
        assert_eq!(
            classify_investor(3, dec!(0.05), Objective::Income),
            InvestorArchetype::Moderate
        );
    }

    #[test]
    fn test_objective_parsing() {
        assert_eq!("growth".parse::<Objective>().unwrap(), Objective::Growth);
        assert_eq!("2".parse::<Objective>().unwrap(), Objective::Income);
        assert_eq!(" Balanced ".parse::<Objective>().unwrap(), Objective::Balanced);
        assert!("yield".parse::<Objective>().is_err());
    }

    #[test]
    fn test_objective_deserialize_legacy_code() {
        let obj: Objective = serde_json::from_str("\"1\"").unwrap();
        assert_eq!(obj, Objective::Growth);
        let obj: Objective = serde_json::from_str("\"income\"").unwrap();
        assert_eq!(obj, Objective::Income);
    }

    #[test]
    fn test_validate() {
        assert!(profile().validate().is_ok());

        let mut p = profile();
        p.investment_amount = Decimal::ZERO;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.horizon_years = 0;
        assert!(p.validate().is_err());

        let mut p = profile();
        p.risk_tolerance = dec!(0.25);
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_archetype_labels() {
        assert_eq!(profile().archetype(), InvestorArchetype::Moderate);
        assert_eq!(InvestorArchetype::Aggressive.label(), "Aggressive Investor");
    }
}
