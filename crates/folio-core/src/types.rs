use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values and prices. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates, returns, volatilities and weights expressed as decimals (0.05 = 5%).
pub type Rate = Decimal;

/// Percentages expressed on a 0-100 scale (used for capital utilisation
/// and sector exposure, which are reported the way they are displayed).
pub type Percent = Decimal;

/// Whole-year holding horizon
pub type Years = u32;

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
