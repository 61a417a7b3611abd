use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use folio_core::profile::{classify_investor as classify, Objective};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[napi]
pub fn generate_portfolios(input_json: String) -> NapiResult<String> {
    let input: folio_core::construction::engine::ConstructionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = folio_core::construction::engine::generate_portfolios(&input)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn estimate_returns(input_json: String) -> NapiResult<String> {
    let input: folio_core::estimation::returns::ReturnEstimationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        folio_core::estimation::returns::estimate_universe(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[napi]
pub fn allocate_shares(input_json: String) -> NapiResult<String> {
    let input: folio_core::allocation::shares::AllocationInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        folio_core::allocation::shares::calculate_allocation(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct ClassifyInput {
    #[serde(alias = "holding_period")]
    horizon_years: u32,
    risk_tolerance: Decimal,
    objective: Objective,
}

#[napi]
pub fn classify_investor(input_json: String) -> NapiResult<String> {
    let input: ClassifyInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let archetype = classify(input.horizon_years, input.risk_tolerance, input.objective);
    let output = serde_json::json!({
        "archetype": archetype,
        "label": archetype.label(),
    });
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

#[napi]
pub fn project_portfolio_value(input_json: String) -> NapiResult<String> {
    let input: folio_core::projection::ProjectionInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        folio_core::projection::project_portfolio_value(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
