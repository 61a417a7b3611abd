use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FolioError;
use crate::instrument::{eligible_instruments, InstrumentRecord};
use crate::types::*;
use crate::FolioResult;

/// Monthly observations per year of horizon.
pub const MONTHS_PER_YEAR: usize = 12;

/// Forward return estimate for a single instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnEstimate {
    pub ticker: String,
    pub sector: String,
    /// Annualised expected return (CAGR of the average future price)
    pub expected_return: Rate,
    /// Number of valid future price samples inside the horizon window
    pub samples_used: usize,
}

/// Input for estimating every instrument in a universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnEstimationInput {
    pub instruments: Vec<InstrumentRecord>,
    pub horizon_years: Years,
}

/// Ranked estimates for the eligible part of a universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnEstimationOutput {
    /// Highest expected return first; ties keep universe order
    pub estimates: Vec<ReturnEstimate>,
    pub excluded_count: usize,
}

/// Annualised expected return of one instrument over `horizon_years`.
///
/// Averages the valid (present, positive) prices among the first
/// `horizon_years * 12` monthly observations and annualises the ratio to the
/// current price: `(avg / current)^(1/H) - 1`. Every degenerate case
/// (non-positive price, zero horizon, no samples, failed power) is 0.
pub fn estimate_return(record: &InstrumentRecord, horizon_years: Years) -> Rate {
    estimate_instrument(record, horizon_years).expected_return
}

/// Same as [`estimate_return`] but keeps the ticker, sector and sample count.
pub fn estimate_instrument(record: &InstrumentRecord, horizon_years: Years) -> ReturnEstimate {
    let mut estimate = ReturnEstimate {
        ticker: record.ticker.clone(),
        sector: record.sector.clone(),
        expected_return: Decimal::ZERO,
        samples_used: 0,
    };

    if record.current_price <= Decimal::ZERO || horizon_years == 0 {
        return estimate;
    }

    let window = horizon_years as usize * MONTHS_PER_YEAR;
    let samples: Vec<Money> = record
        .history
        .iter()
        .take(window)
        .filter_map(|p| p.valid_price())
        .collect();

    if samples.is_empty() {
        return estimate;
    }

    let total: Money = samples.iter().sum();
    let avg_future = total / Decimal::from(samples.len() as i64);

    estimate.samples_used = samples.len();
    estimate.expected_return = annualised_growth(avg_future / record.current_price, horizon_years);
    estimate
}

/// `ratio^(1/H) - 1`, or 0 when the root cannot be taken.
fn annualised_growth(ratio: Decimal, horizon_years: Years) -> Rate {
    if ratio <= Decimal::ZERO || horizon_years == 0 {
        return Decimal::ZERO;
    }
    if horizon_years == 1 {
        return ratio - Decimal::ONE;
    }
    let exponent = Decimal::ONE / Decimal::from(horizon_years);
    ratio
        .checked_powd(exponent)
        .map(|g| g - Decimal::ONE)
        .unwrap_or(Decimal::ZERO)
}

/// Indices of `returns` sorted by descending return, stable for ties.
pub fn rank_descending(returns: &[Rate]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..returns.len()).collect();
    order.sort_by(|a, b| returns[*b].cmp(&returns[*a]));
    order
}

/// Estimate and rank every eligible instrument in a universe.
pub fn estimate_universe(
    input: &ReturnEstimationInput,
) -> FolioResult<ComputationOutput<ReturnEstimationOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.horizon_years == 0 {
        return Err(FolioError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Holding horizon must be at least 1 year".into(),
        });
    }

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

    let raw: Vec<ReturnEstimate> = eligible
        .iter()
        .map(|r| estimate_instrument(r, input.horizon_years))
        .collect();
    let unsampled = raw.iter().filter(|e| e.samples_used == 0).count();
    if unsampled > 0 {
        warnings.push(format!(
            "{unsampled} instrument(s) have no valid price inside the {}-month window; estimate set to 0",
            input.horizon_years as usize * MONTHS_PER_YEAR
        ));
    }

    let returns: Vec<Rate> = raw.iter().map(|e| e.expected_return).collect();
    let estimates: Vec<ReturnEstimate> = rank_descending(&returns)
        .into_iter()
        .map(|i| raw[i].clone())
        .collect();

    let output = ReturnEstimationOutput {
        estimates,
        excluded_count,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Forward return estimate: CAGR of the mean future monthly price over the horizon window",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "window_months": input.horizon_years as usize * MONTHS_PER_YEAR,
            "instruments": input.instruments.len(),
        }),
        warnings,
        elapsed,
        output,
    ))
}
