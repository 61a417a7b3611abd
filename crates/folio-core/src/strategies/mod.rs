//! Weight strategies: `(returns, covariance) -> weights`.
//!
//! The compatible set reproduces the three allocations the product has
//! always shipped (two of which are equal-weight stand-ins). The optimised
//! set swaps the stand-ins for real solvers behind the same trait, so the
//! allocator and metrics never know which one ran.

pub mod compatible;
#[cfg(feature = "solvers")]
pub mod hrp;
#[cfg(feature = "solvers")]
pub mod min_variance;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::*;
use crate::FolioResult;

/// One non-negative fraction per selected instrument, summing to 1.
pub type WeightVector = Vec<Rate>;

/// Tolerance for the sum-to-one invariant.
pub const WEIGHT_SUM_TOLERANCE: Decimal = dec!(0.000000001);

/// The three allocation philosophies, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    MinimumVariance,
    ReturnWeighted,
    RiskParity,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::MinimumVariance,
        StrategyKind::ReturnWeighted,
        StrategyKind::RiskParity,
    ];

    /// Name shown to investors.
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::MinimumVariance => "Minimum Variance",
            StrategyKind::ReturnWeighted => "Sharpe Ratio Optimized",
            StrategyKind::RiskParity => "Hierarchical Risk Parity",
        }
    }
}

/// A named weighting rule.
pub trait WeightStrategy {
    fn kind(&self) -> StrategyKind;

    fn name(&self) -> &'static str {
        self.kind().display_name()
    }

    /// Weights for the instruments indexed like `returns` and `covariance`.
    /// An empty selection yields an empty vector.
    fn compute(&self, returns: &[Rate], covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector>;
}

/// Which implementations back the three strategy slots.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategySet {
    /// Equal-weight minimum variance, return-weighted, equal-weight risk parity
    #[default]
    Compatible,
    /// Long-only minimum-variance solver, return-weighted, hierarchical risk parity
    #[cfg(feature = "solvers")]
    Optimized,
}

impl StrategySet {
    /// Strategies in reporting order: minimum variance, return weighted, risk parity.
    pub fn strategies(&self) -> Vec<Box<dyn WeightStrategy>> {
        match self {
            StrategySet::Compatible => vec![
                Box::new(compatible::EqualWeightMinimumVariance),
                Box::new(compatible::ReturnWeighted),
                Box::new(compatible::EqualWeightRiskParity),
            ],
            #[cfg(feature = "solvers")]
            StrategySet::Optimized => vec![
                Box::new(min_variance::LongOnlyMinimumVariance),
                Box::new(compatible::ReturnWeighted),
                Box::new(hrp::HierarchicalRiskParity),
            ],
        }
    }
}

/// `true` when the weights are non-negative and sum to 1 within tolerance.
pub fn is_valid_weight_vector(weights: &[Rate]) -> bool {
    if weights.is_empty() {
        return true;
    }
    let total: Decimal = weights.iter().sum();
    weights.iter().all(|w| *w >= Decimal::ZERO)
        && (total - Decimal::ONE).abs() <= WEIGHT_SUM_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::covariance::build_covariance;

    #[test]
    fn test_compatible_order_and_names() {
        let names: Vec<&str> = StrategySet::Compatible
            .strategies()
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(
            names,
            vec![
                "Minimum Variance",
                "Sharpe Ratio Optimized",
                "Hierarchical Risk Parity"
            ]
        );
    }

    #[test]
    fn test_every_set_produces_valid_weights() {
        let returns = vec![dec!(0.12), dec!(-0.03), dec!(0.07), dec!(0.2)];
        let cov = build_covariance(&[dec!(0.25), dec!(0.1), dec!(0.4), dec!(0.18)]);
        let mut sets = vec![StrategySet::Compatible];
        #[cfg(feature = "solvers")]
        sets.push(StrategySet::Optimized);
        for set in sets {
            for strategy in set.strategies() {
                let w = strategy.compute(&returns, &cov).unwrap();
                assert_eq!(w.len(), 4);
                assert!(is_valid_weight_vector(&w), "{} -> {:?}", strategy.name(), w);
            }
        }
    }

    #[test]
    fn test_weight_vector_check() {
        assert!(is_valid_weight_vector(&[]));
        assert!(is_valid_weight_vector(&[dec!(0.5), dec!(0.5)]));
        assert!(!is_valid_weight_vector(&[dec!(0.5), dec!(0.4)]));
        assert!(!is_valid_weight_vector(&[dec!(1.5), dec!(-0.5)]));
    }

    #[test]
    fn test_strategy_set_serde() {
        let set: StrategySet = serde_json::from_str("\"compatible\"").unwrap();
        assert_eq!(set, StrategySet::Compatible);
        assert_eq!(StrategySet::default(), StrategySet::Compatible);
    }
}
