use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::allocation::shares::AllocationPlan;
use crate::error::FolioError;
use crate::math::{quadratic_form, sqrt_decimal, vec_dot};
use crate::strategies::{StrategyKind, WeightVector};
use crate::types::*;
use crate::FolioResult;

/// Default one-tailed VaR confidence.
pub const DEFAULT_CONFIDENCE: Rate = dec!(0.95);

/// Risk-adjusted return. `Undefined` when portfolio risk is zero, so a
/// division by zero is never formatted as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharpeRatio {
    Defined(Decimal),
    Undefined,
}

impl SharpeRatio {
    pub fn compute(portfolio_return: Rate, risk_free_rate: Rate, portfolio_risk: Rate) -> Self {
        if portfolio_risk.is_zero() {
            SharpeRatio::Undefined
        } else {
            SharpeRatio::Defined((portfolio_return - risk_free_rate) / portfolio_risk)
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            SharpeRatio::Defined(v) => Some(*v),
            SharpeRatio::Undefined => None,
        }
    }
}

/// Qualitative reading of the Sharpe ratio shown next to each portfolio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    Excellent,
    Good,
    Moderate,
    Low,
    Unrated,
}

impl PerformanceTier {
    pub fn from_sharpe(sharpe: &SharpeRatio) -> Self {
        match sharpe.value() {
            None => PerformanceTier::Unrated,
            Some(s) if s > dec!(1.5) => PerformanceTier::Excellent,
            Some(s) if s > dec!(1.0) => PerformanceTier::Good,
            Some(s) if s > dec!(0.5) => PerformanceTier::Moderate,
            Some(_) => PerformanceTier::Low,
        }
    }

    pub fn insight(&self) -> &'static str {
        match self {
            PerformanceTier::Excellent => {
                "Excellent risk-adjusted return. Strong portfolio performance expected."
            }
            PerformanceTier::Good => "Good risk-return tradeoff. Solid investment strategy.",
            PerformanceTier::Moderate => {
                "Moderate performance expected. Consider risk optimization."
            }
            PerformanceTier::Low => {
                "Lower risk-adjusted returns. Review strategy for better optimization."
            }
            PerformanceTier::Unrated => {
                "Portfolio risk is zero, so a risk-adjusted return cannot be computed."
            }
        }
    }
}

/// One line of the purchase plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    pub ticker: String,
    pub sector: String,
    pub weight: Rate,
    pub price: Money,
    pub shares: u64,
    pub amount_used: Money,
    pub percent_of_capital: Percent,
}

/// Everything reported for one strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub strategy: StrategyKind,
    pub method: String,
    pub weights: WeightVector,
    pub holdings: Vec<Holding>,
    pub expected_return: Rate,
    pub portfolio_risk: Rate,
    pub sharpe_ratio: SharpeRatio,
    pub performance_tier: PerformanceTier,
    pub insight: String,
    /// Parametric one-tailed VaR in currency
    pub value_at_risk: Money,
    pub var_confidence: Rate,
    pub future_value: Money,
    /// Sector -> percent of capital; zero-exposure sectors omitted
    pub sector_exposure: BTreeMap<String, Percent>,
    pub total_invested: Money,
    pub invested_percent: Percent,
    pub uninvested_amount: Money,
}

/// Per-session parameters and the selected instruments' descriptive data,
/// indexed like the weights.
#[derive(Debug, Clone)]
pub struct MetricsContext<'a> {
    pub tickers: &'a [String],
    pub sectors: &'a [String],
    pub prices: &'a [Money],
    pub capital: Money,
    pub risk_free_rate: Rate,
    pub horizon_years: Years,
    pub confidence_level: Rate,
}

/// Aggregate weights, estimates, covariance and the allocation plan into a
/// [`PortfolioSummary`].
///
/// - expected return `Σ wi·ri`, risk `sqrt(w'Cw)`
/// - Sharpe `(R - rf) / σ`, `Undefined` for σ = 0
/// - VaR `M · |R - z·σ|`
/// - future value `M · (1 + R)^H`
/// - sector exposure `Σ spend_i / M · 100` per sector
pub fn calculate_portfolio_metrics(
    strategy: StrategyKind,
    weights: &[Rate],
    returns: &[Rate],
    covariance: &[Vec<Decimal>],
    plan: &AllocationPlan,
    ctx: &MetricsContext<'_>,
) -> FolioResult<PortfolioSummary> {
    let n = weights.len();
    let lengths = [
        ("returns", returns.len()),
        ("covariance_matrix", covariance.len()),
        ("shares", plan.shares.len()),
        ("spent", plan.spent.len()),
        ("tickers", ctx.tickers.len()),
        ("sectors", ctx.sectors.len()),
        ("prices", ctx.prices.len()),
    ];
    for (field, len) in lengths {
        if len != n {
            return Err(FolioError::InvalidInput {
                field: field.into(),
                reason: format!("Expected {n} entries to match the weights, got {len}"),
            });
        }
    }

    let z = z_score_for_confidence(ctx.confidence_level)?;

    let expected_return = vec_dot(weights, returns);
    let portfolio_risk = sqrt_decimal(quadratic_form(weights, covariance));
    let sharpe_ratio = SharpeRatio::compute(expected_return, ctx.risk_free_rate, portfolio_risk);
    let performance_tier = PerformanceTier::from_sharpe(&sharpe_ratio);

    let value_at_risk = ctx.capital * (expected_return - z * portfolio_risk).abs();
    let future_value = ctx.capital
        * (Decimal::ONE + expected_return)
            .checked_powu(ctx.horizon_years as u64)
            .ok_or_else(|| {
                FolioError::FinancialImpossibility(format!(
                    "Future value overflow compounding {} over {} years",
                    expected_return, ctx.horizon_years
                ))
            })?;

    let pct = |amount: Money| -> Percent {
        if ctx.capital > Decimal::ZERO {
            amount / ctx.capital * dec!(100)
        } else {
            Decimal::ZERO
        }
    };

    let holdings: Vec<Holding> = (0..n)
        .map(|i| Holding {
            ticker: ctx.tickers[i].clone(),
            sector: ctx.sectors[i].clone(),
            weight: weights[i],
            price: ctx.prices[i],
            shares: plan.shares[i],
            amount_used: plan.spent[i],
            percent_of_capital: pct(plan.spent[i]),
        })
        .collect();

    let mut sector_exposure: BTreeMap<String, Percent> = BTreeMap::new();
    for h in &holdings {
        *sector_exposure.entry(h.sector.clone()).or_insert(Decimal::ZERO) += h.percent_of_capital;
    }
    sector_exposure.retain(|_, v| !v.is_zero());

    Ok(PortfolioSummary {
        strategy,
        method: strategy.display_name().to_string(),
        weights: weights.to_vec(),
        holdings,
        expected_return,
        portfolio_risk,
        sharpe_ratio,
        performance_tier,
        insight: performance_tier.insight().to_string(),
        value_at_risk,
        var_confidence: ctx.confidence_level,
        future_value,
        sector_exposure,
        total_invested: plan.total_invested,
        invested_percent: pct(plan.total_invested),
        uninvested_amount: plan.leftover,
    })
}

/// One-tailed normal z-score for common confidence levels, linear
/// interpolation between neighbouring tabulated levels from 0.90 to 0.995.
pub fn z_score_for_confidence(confidence: Rate) -> FolioResult<Decimal> {
    if confidence <= Decimal::ZERO || confidence >= Decimal::ONE {
        return Err(FolioError::InvalidInput {
            field: "confidence_level".into(),
            reason: "Confidence level must be between 0 and 1 (exclusive)".into(),
        });
    }

    let table = [
        (dec!(0.90), dec!(1.282)),
        (dec!(0.95), dec!(1.645)),
        (dec!(0.975), dec!(1.960)),
        (dec!(0.99), dec!(2.326)),
        (dec!(0.995), dec!(2.576)),
    ];
    for pair in table.windows(2) {
        let (lo_c, lo_z) = pair[0];
        let (hi_c, hi_z) = pair[1];
        if confidence >= lo_c && confidence <= hi_c {
            let t = (confidence - lo_c) / (hi_c - lo_c);
            return Ok(lo_z + t * (hi_z - lo_z));
        }
    }

    Err(FolioError::InvalidInput {
        field: "confidence_level".into(),
        reason: "Supported confidence levels are 0.90 to 0.995".into(),
    })
}
