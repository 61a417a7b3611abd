use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

use crate::allocation::shares::allocate_shares;
use crate::error::FolioError;
use crate::estimation::covariance::{
    build_covariance, validate_covariance_matrix, CROSS_CORRELATION,
};
use crate::estimation::returns::{estimate_instrument, rank_descending, ReturnEstimate};
use crate::instrument::{eligible_instruments, InstrumentRecord};
use crate::metrics::summary::{
    calculate_portfolio_metrics, z_score_for_confidence, MetricsContext, PortfolioSummary,
    SharpeRatio, DEFAULT_CONFIDENCE,
};
use crate::profile::{InvestorArchetype, RiskProfile};
use crate::strategies::compatible::uses_equal_weight_fallback;
use crate::strategies::{is_valid_weight_vector, StrategyKind, StrategySet};
use crate::types::*;
use crate::FolioResult;

/// Annual risk-free rate used for the Sharpe ratio when none is given.
pub const DEFAULT_RISK_FREE_RATE: Rate = dec!(0.0698);

/// Holdings cap applied after ranking by expected return.
pub const DEFAULT_MAX_HOLDINGS: usize = 15;

fn default_risk_free_rate() -> Rate {
    DEFAULT_RISK_FREE_RATE
}

fn default_max_holdings() -> usize {
    DEFAULT_MAX_HOLDINGS
}

fn default_confidence() -> Rate {
    DEFAULT_CONFIDENCE
}

/// Everything one construction session needs, passed explicitly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionInput {
    pub instruments: Vec<InstrumentRecord>,
    pub profile: RiskProfile,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: Rate,
    #[serde(default = "default_max_holdings")]
    pub max_holdings: usize,
    /// VaR confidence level
    #[serde(default = "default_confidence")]
    pub confidence_level: Rate,
    #[serde(default)]
    pub strategy_set: StrategySet,
}

/// An instrument that made the holdings cut.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedInstrument {
    pub ticker: String,
    pub sector: String,
    pub current_price: Money,
    pub volatility: Rate,
    pub expected_return: Rate,
    pub samples_used: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionOutput {
    pub archetype: InvestorArchetype,
    pub investor_label: String,
    /// Selected instruments, highest expected return first
    pub selected: Vec<SelectedInstrument>,
    /// Minimum variance, return weighted, risk parity, in that order
    pub portfolios: Vec<PortfolioSummary>,
    pub excluded_count: usize,
}

/// Build the three candidate portfolios for a risk profile.
///
/// Filters the universe to eligible instruments, ranks them by estimated
/// return, keeps the top `max_holdings`, then runs every strategy of the
/// configured set through allocation and metrics. Either every portfolio is
/// produced or the whole call fails.
pub fn generate_portfolios(
    input: &ConstructionInput,
) -> FolioResult<ComputationOutput<ConstructionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    input.profile.validate()?;
    if input.max_holdings == 0 {
        return Err(FolioError::InvalidInput {
            field: "max_holdings".into(),
            reason: "At least one holding is required".into(),
        });
    }
    z_score_for_confidence(input.confidence_level)?;

    let capital = input.profile.investment_amount;
    let horizon = input.profile.horizon_years;

    // --- Eligibility ---
    let (eligible, excluded_count) = eligible_instruments(&input.instruments);
    if eligible.is_empty() {
        return Err(FolioError::EmptyUniverse(
            "No instruments with a positive price and valid volatility".into(),
        ));
    }
    if excluded_count > 0 {
        warnings.push(format!(
            "{excluded_count} instrument(s) excluded for non-positive price or negative volatility"
        ));
    }

    // --- Return estimation and selection ---
    let estimates: Vec<ReturnEstimate> = eligible
        .iter()
        .map(|r| estimate_instrument(r, horizon))
        .collect();
    let all_returns: Vec<Rate> = estimates.iter().map(|e| e.expected_return).collect();
    let order = rank_descending(&all_returns);

    let selected: Vec<SelectedInstrument> = order
        .into_iter()
        .take(input.max_holdings)
        .map(|i| SelectedInstrument {
            ticker: eligible[i].ticker.clone(),
            sector: eligible[i].sector.clone(),
            current_price: eligible[i].current_price,
            volatility: eligible[i].volatility,
            expected_return: estimates[i].expected_return,
            samples_used: estimates[i].samples_used,
        })
        .collect();

    if selected.is_empty() {
        return Err(FolioError::EmptyUniverse(
            "No instruments left after ranking".into(),
        ));
    }
    if selected.len() < input.max_holdings {
        warnings.push(format!(
            "Only {} eligible instrument(s); holdings cap is {}",
            selected.len(),
            input.max_holdings
        ));
    }
    let unsampled = selected.iter().filter(|s| s.samples_used == 0).count();
    if unsampled > 0 {
        warnings.push(format!(
            "{unsampled} selected instrument(s) have no price history inside the horizon; expected return set to 0"
        ));
    }
    debug!(
        eligible = eligible.len(),
        selected = selected.len(),
        "ranked universe"
    );

    let tickers: Vec<String> = selected.iter().map(|s| s.ticker.clone()).collect();
    let sectors: Vec<String> = selected.iter().map(|s| s.sector.clone()).collect();
    let prices: Vec<Money> = selected.iter().map(|s| s.current_price).collect();
    let vols: Vec<Rate> = selected.iter().map(|s| s.volatility).collect();
    let returns: Vec<Rate> = selected.iter().map(|s| s.expected_return).collect();

    // --- Risk model ---
    let covariance = build_covariance(&vols);
    validate_covariance_matrix(&covariance, selected.len())?;

    let ctx = MetricsContext {
        tickers: &tickers,
        sectors: &sectors,
        prices: &prices,
        capital,
        risk_free_rate: input.risk_free_rate,
        horizon_years: horizon,
        confidence_level: input.confidence_level,
    };

    // --- Strategies, allocation, metrics ---
    let mut portfolios: Vec<PortfolioSummary> = Vec::with_capacity(3);
    for strategy in input.strategy_set.strategies() {
        let kind = strategy.kind();
        let weights = strategy.compute(&returns, &covariance)?;
        if !is_valid_weight_vector(&weights) {
            return Err(FolioError::FinancialImpossibility(format!(
                "{} produced weights that are negative or do not sum to 1",
                strategy.name()
            )));
        }
        if kind == StrategyKind::ReturnWeighted && uses_equal_weight_fallback(&returns) {
            warn!("no positive expected return; return-weighted falls back to equal weight");
            warnings.push(format!(
                "{}: no instrument has a positive expected return, using equal weights",
                strategy.name()
            ));
        }

        let plan = allocate_shares(&weights, &prices, capital)?;
        let summary =
            calculate_portfolio_metrics(kind, &weights, &returns, &covariance, &plan, &ctx)?;

        if summary.sharpe_ratio == SharpeRatio::Undefined {
            warnings.push(format!(
                "{}: portfolio risk is zero, Sharpe ratio is undefined",
                strategy.name()
            ));
        }
        debug!(
            strategy = strategy.name(),
            expected_return = %summary.expected_return,
            risk = %summary.portfolio_risk,
            leftover = %summary.uninvested_amount,
            "portfolio built"
        );
        portfolios.push(summary);
    }

    let archetype = input.profile.archetype();
    let output = ConstructionOutput {
        archetype,
        investor_label: archetype.label().to_string(),
        selected,
        portfolios,
        excluded_count,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Top-N return ranking, uniform-correlation covariance, three weighting strategies with whole-share allocation",
        &serde_json::json!({
            "risk_free_rate": input.risk_free_rate.to_string(),
            "max_holdings": input.max_holdings,
            "confidence_level": input.confidence_level.to_string(),
            "cross_correlation": CROSS_CORRELATION.to_string(),
            "strategy_set": input.strategy_set,
            "capital": capital.to_string(),
            "horizon_years": horizon,
        }),
        warnings,
        elapsed,
        output,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::PricePoint;
    use crate::profile::Objective;
    use rust_decimal::Decimal;

    fn flat_history(price: Decimal, months: usize) -> Vec<PricePoint> {
        (0..months)
            .map(|m| PricePoint::new(format!("2024-{:02}", m % 12 + 1), Some(price)))
            .collect()
    }

    fn record(
        ticker: &str,
        sector: &str,
        price: Decimal,
        vol: Decimal,
        future: Decimal,
    ) -> InstrumentRecord {
        InstrumentRecord {
            ticker: ticker.into(),
            sector: sector.into(),
            current_price: price,
            volatility: vol,
            history: flat_history(future, 12),
        }
    }

    fn universe() -> Vec<InstrumentRecord> {
        vec![
            record("AAA", "IT", dec!(100), dec!(0.20), dec!(110)),
            record("BBB", "Banking", dec!(50), dec!(0.30), dec!(60)),
            record("CCC", "Energy", dec!(20), dec!(0.10), dec!(19)),
            record("BAD", "Energy", dec!(-1), dec!(0.10), dec!(5)),
        ]
    }

    fn input(instruments: Vec<InstrumentRecord>) -> ConstructionInput {
        ConstructionInput {
            instruments,
            profile: RiskProfile {
                investment_amount: dec!(10000),
                horizon_years: 1,
                risk_tolerance: dec!(0.10),
                objective: Objective::Growth,
            },
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            max_holdings: DEFAULT_MAX_HOLDINGS,
            confidence_level: DEFAULT_CONFIDENCE,
            strategy_set: StrategySet::Compatible,
        }
    }

    #[test]
    fn test_three_portfolios_in_order() {
        let out = generate_portfolios(&input(universe())).unwrap();
        let kinds: Vec<StrategyKind> = out.result.portfolios.iter().map(|p| p.strategy).collect();
        assert_eq!(kinds, StrategyKind::ALL.to_vec());
        assert_eq!(out.result.excluded_count, 1);
        assert_eq!(out.result.archetype, InvestorArchetype::Moderate);
    }

    #[test]
    fn test_selection_ranked_by_return() {
        let out = generate_portfolios(&input(universe())).unwrap();
        let tickers: Vec<&str> = out.result.selected.iter().map(|s| s.ticker.as_str()).collect();
        assert_eq!(tickers, vec!["BBB", "AAA", "CCC"]);
        assert_eq!(out.result.selected[0].expected_return, dec!(0.2));
        assert_eq!(out.result.selected[2].expected_return, dec!(-0.05));
    }

    #[test]
    fn test_holdings_cap() {
        let mut inp = input(universe());
        inp.max_holdings = 2;
        let out = generate_portfolios(&inp).unwrap();
        assert_eq!(out.result.selected.len(), 2);
        for p in &out.result.portfolios {
            assert_eq!(p.weights.len(), 2);
            assert_eq!(p.holdings.len(), 2);
        }
    }

    #[test]
    fn test_equal_weight_allocation_exhausts_capital() {
        let out = generate_portfolios(&input(universe())).unwrap();
        let mv = &out.result.portfolios[0];
        // 66 x 50, 33 x 100, 166 x 20 then 4 more of the 20 priced instrument
        let shares: Vec<u64> = mv.holdings.iter().map(|h| h.shares).collect();
        assert_eq!(shares, vec![66, 33, 170]);
        assert_eq!(mv.uninvested_amount, Decimal::ZERO);
        assert_eq!(mv.total_invested + mv.uninvested_amount, dec!(10000));
    }

    #[test]
    fn test_return_weighted_ignores_negative_returns() {
        let out = generate_portfolios(&input(universe())).unwrap();
        let rw = &out.result.portfolios[1];
        assert_eq!(rw.weights[2], Decimal::ZERO);
        assert!(rw.weights[0] > rw.weights[1]);
        // 133 x 50 + 33 x 100 leaves 50, which buys two of the 20 priced instrument
        let shares: Vec<u64> = rw.holdings.iter().map(|h| h.shares).collect();
        assert_eq!(shares, vec![133, 33, 2]);
        assert_eq!(rw.uninvested_amount, dec!(10));
    }

    #[test]
    fn test_empty_universe_fails() {
        let bad = vec![record("BAD", "Energy", dec!(0), dec!(0.1), dec!(5))];
        match generate_portfolios(&input(bad)) {
            Err(FolioError::EmptyUniverse(_)) => {}
            other => panic!("expected EmptyUniverse, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_profile_fails() {
        let mut inp = input(universe());
        inp.profile.risk_tolerance = dec!(0.5);
        assert!(generate_portfolios(&inp).is_err());
        let mut inp = input(universe());
        inp.profile.investment_amount = Decimal::ZERO;
        assert!(generate_portfolios(&inp).is_err());
    }

    #[test]
    fn test_zero_volatility_sharpe_undefined_warns() {
        let flat = vec![
            record("AAA", "IT", dec!(100), dec!(0), dec!(110)),
            record("BBB", "IT", dec!(50), dec!(0), dec!(55)),
        ];
        let out = generate_portfolios(&input(flat)).unwrap();
        assert!(out
            .result
            .portfolios
            .iter()
            .all(|p| p.sharpe_ratio == SharpeRatio::Undefined));
        assert!(out.warnings.iter().any(|w| w.contains("Sharpe ratio is undefined")));
    }

    #[test]
    fn test_fallback_warning_when_no_positive_return() {
        let falling = vec![
            record("AAA", "IT", dec!(100), dec!(0.2), dec!(90)),
            record("BBB", "IT", dec!(50), dec!(0.2), dec!(40)),
        ];
        let out = generate_portfolios(&input(falling)).unwrap();
        let rw = &out.result.portfolios[1];
        assert_eq!(rw.weights, vec![dec!(0.5), dec!(0.5)]);
        assert!(out.warnings.iter().any(|w| w.contains("equal weights")));
    }

    #[cfg(feature = "solvers")]
    #[test]
    fn test_optimized_set_runs() {
        let mut inp = input(universe());
        inp.strategy_set = StrategySet::Optimized;
        let out = generate_portfolios(&inp).unwrap();
        assert_eq!(out.result.portfolios.len(), 3);
        for p in &out.result.portfolios {
            assert!(is_valid_weight_vector(&p.weights));
        }
        // lowest-volatility instrument carries the largest minimum-variance weight
        let mv = &out.result.portfolios[0];
        assert!(mv.weights[2] > mv.weights[0]);
        assert!(mv.weights[2] > mv.weights[1]);
    }

    #[test]
    fn test_input_defaults_from_json() {
        let json = serde_json::json!({
            "instruments": [],
            "profile": {
                "investment_amount": "5000",
                "horizon_years": 2,
                "risk_tolerance": "0.05",
                "objective": "Income"
            }
        });
        let inp: ConstructionInput = serde_json::from_value(json).unwrap();
        assert_eq!(inp.max_holdings, 15);
        assert_eq!(inp.risk_free_rate, dec!(0.0698));
        assert_eq!(inp.strategy_set, StrategySet::Compatible);
        assert_eq!(inp.profile.archetype(), InvestorArchetype::Conservative);
    }
}
