use rust_decimal::Decimal;
use tracing::debug;

use super::{StrategyKind, WeightStrategy, WeightVector};
use crate::error::FolioError;
use crate::math::{equal_weights, mat_inverse, mat_vec_multiply};
use crate::types::*;
use crate::FolioResult;

/// Long-only minimum-variance weights.
///
/// Solves `Σ⁻¹1 / 1'Σ⁻¹1` on an active set of instruments, dropping every
/// instrument the closed form wants to short and re-solving until all
/// weights are non-negative. Dropped instruments get weight 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongOnlyMinimumVariance;

impl WeightStrategy for LongOnlyMinimumVariance {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MinimumVariance
    }

    fn compute(&self, _returns: &[Rate], covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
        let n = covariance.len();
        if n <= 1 {
            return Ok(equal_weights(n));
        }

        // Riskless instruments make the matrix singular and already reach zero variance
        let riskless: Vec<usize> = (0..n).filter(|&i| covariance[i][i].is_zero()).collect();
        if !riskless.is_empty() {
            let share = Decimal::ONE / Decimal::from(riskless.len() as i64);
            let mut weights = vec![Decimal::ZERO; n];
            for i in riskless {
                weights[i] = share;
            }
            return Ok(weights);
        }

        let mut active: Vec<usize> = (0..n).collect();
        loop {
            let sub: Vec<Vec<Decimal>> = active
                .iter()
                .map(|&i| active.iter().map(|&j| covariance[i][j]).collect())
                .collect();
            let w = closed_form_weights(&sub)?;

            if w.iter().all(|x| *x >= Decimal::ZERO) {
                let mut weights = vec![Decimal::ZERO; n];
                for (&i, wi) in active.iter().zip(w.iter()) {
                    weights[i] = *wi;
                }
                return Ok(weights);
            }

            let before = active.len();
            active = active
                .iter()
                .zip(w.iter())
                .filter(|(_, wi)| **wi >= Decimal::ZERO)
                .map(|(&i, _)| i)
                .collect();
            debug!(
                dropped = before - active.len(),
                remaining = active.len(),
                "minimum variance: removed short positions from active set"
            );
        }
    }
}

/// w = Σ⁻¹1 / (1'Σ⁻¹1)
fn closed_form_weights(cov: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
    let n = cov.len();
    let inv = mat_inverse(cov)?;
    let inv_ones = mat_vec_multiply(&inv, &vec![Decimal::ONE; n]);
    let denom: Decimal = inv_ones.iter().sum();
    if denom.is_zero() {
        return Err(FolioError::DivisionByZero {
            context: "minimum variance denominator (1' Sigma^-1 1)".into(),
        });
    }
    Ok(inv_ones.iter().map(|v| *v / denom).collect())
}
