use rust_decimal::Decimal;

use super::{StrategyKind, WeightStrategy, WeightVector};
use crate::math::equal_weights;
use crate::types::*;
use crate::FolioResult;

/// Minimum-variance slot filled with equal weights `1/n`.
///
/// Stand-in for a variance-minimising solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightMinimumVariance;

impl WeightStrategy for EqualWeightMinimumVariance {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MinimumVariance
    }

    fn compute(&self, _returns: &[Rate], covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
        Ok(equal_weights(covariance.len()))
    }
}

/// Weights proportional to `max(0, expected return)`.
///
/// Falls back to equal weights when no instrument has a positive return.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnWeighted;

impl WeightStrategy for ReturnWeighted {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ReturnWeighted
    }

    fn compute(&self, returns: &[Rate], _covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
        Ok(return_weights(returns))
    }
}

/// Risk-parity slot filled with equal weights `1/n`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqualWeightRiskParity;

impl WeightStrategy for EqualWeightRiskParity {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RiskParity
    }

    fn compute(&self, _returns: &[Rate], covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
        Ok(equal_weights(covariance.len()))
    }
}

/// `true` when [`ReturnWeighted`] would fall back to equal weights.
pub fn uses_equal_weight_fallback(returns: &[Rate]) -> bool {
    !returns.is_empty() && returns.iter().all(|r| *r <= Decimal::ZERO)
}

fn return_weights(returns: &[Rate]) -> WeightVector {
    let clipped: Vec<Rate> = returns.iter().map(|r| (*r).max(Decimal::ZERO)).collect();
    let total: Decimal = clipped.iter().sum();
    if total.is_zero() {
        return equal_weights(returns.len());
    }
    clipped.iter().map(|w| *w / total).collect()
}
