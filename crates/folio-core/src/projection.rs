use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use statrs::distribution::Normal;
use std::time::Instant;

use crate::error::FolioError;
use crate::types::{ComputationMetadata, ComputationOutput, Money, Rate, Years};
use crate::FolioResult;

fn with_metadata_f64<T: Serialize>(
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
            precision: "ieee754_f64".to_string(),
        },
    }
}

/// Input for simulating the horizon value of a constructed portfolio.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// Starting value, usually the invested capital
    pub initial_value: Money,
    /// Annual expected portfolio return
    pub expected_return: Rate,
    /// Annual portfolio risk (standard deviation)
    pub portfolio_risk: Rate,
    pub horizon_years: Years,
    #[serde(default = "default_num_simulations")]
    pub num_simulations: u32,
    /// Optional seed for reproducibility.
    pub seed: Option<u64>,
}

fn default_num_simulations() -> u32 {
    10_000
}

/// Distribution of simulated terminal values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionOutput {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub p5: f64,
    pub p95: f64,
    /// Share of paths ending below the initial value
    pub probability_of_loss: f64,
    /// Deterministic compounding at the expected return, for comparison
    pub deterministic_value: f64,
    pub simulation_count: u32,
}

/// Simulate terminal portfolio values with independent annual returns
/// drawn from Normal(expected_return, portfolio_risk). A path's value is
/// floored at zero once a draw wipes it out.
pub fn project_portfolio_value(
    input: &ProjectionInput,
) -> FolioResult<ComputationOutput<ProjectionOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.num_simulations == 0 {
        return Err(FolioError::InsufficientData(
            "At least one simulation path is required".into(),
        ));
    }
    if input.horizon_years == 0 {
        return Err(FolioError::InvalidInput {
            field: "horizon_years".into(),
            reason: "Holding horizon must be at least 1 year".into(),
        });
    }
    if input.initial_value <= Decimal::ZERO {
        return Err(FolioError::InvalidInput {
            field: "initial_value".into(),
            reason: "Must be positive".into(),
        });
    }
    if input.portfolio_risk < Decimal::ZERO {
        return Err(FolioError::InvalidInput {
            field: "portfolio_risk".into(),
            reason: "Must be non-negative".into(),
        });
    }

    let initial = to_f64(input.initial_value, "initial_value")?;
    let mu = to_f64(input.expected_return, "expected_return")?;
    let sigma = to_f64(input.portfolio_risk, "portfolio_risk")?;

    let mut rng = match input.seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };
    // statrs rejects a zero standard deviation; those paths are deterministic
    let dist = if sigma > 0.0 {
        Some(Normal::new(mu, sigma).map_err(|e| FolioError::InvalidInput {
            field: "portfolio_risk".into(),
            reason: format!("Invalid Normal parameters: {e}"),
        })?)
    } else {
        None
    };

    let mut wiped_out = 0u32;
    let mut values: Vec<f64> = Vec::with_capacity(input.num_simulations as usize);
    for _ in 0..input.num_simulations {
        let mut value = initial;
        for _ in 0..input.horizon_years {
            let r = match &dist {
                Some(d) => rng.sample(d),
                None => mu,
            };
            value = (value * (1.0 + r)).max(0.0);
        }
        if value == 0.0 {
            wiped_out += 1;
        }
        values.push(value);
    }

    if wiped_out > 0 {
        warnings.push(format!("{wiped_out} path(s) lost the entire initial value"));
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let losses = values.iter().filter(|v| **v < initial).count();

    let output = ProjectionOutput {
        mean,
        median: percentile_sorted(&values, 50.0),
        std_dev: variance.sqrt(),
        p5: percentile_sorted(&values, 5.0),
        p95: percentile_sorted(&values, 95.0),
        probability_of_loss: losses as f64 / n,
        deterministic_value: initial * (1.0 + mu).powi(input.horizon_years as i32),
        simulation_count: input.num_simulations,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata_f64(
        "Monte Carlo horizon value: compounded annual Normal returns",
        &serde_json::json!({
            "horizon_years": input.horizon_years,
            "num_simulations": input.num_simulations,
            "seed": input.seed,
        }),
        warnings,
        elapsed,
        output,
    ))
}

fn to_f64(value: Decimal, field: &str) -> FolioResult<f64> {
    value.to_f64().ok_or_else(|| FolioError::InvalidInput {
        field: field.into(),
        reason: "Value is not representable as f64".into(),
    })
}

/// Linear-interpolated percentile of a sorted, non-empty slice.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] * (1.0 - frac) + sorted[upper] * frac
    }
}
