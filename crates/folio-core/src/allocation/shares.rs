use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::FolioError;
use crate::strategies::is_valid_weight_vector;
use crate::types::*;
use crate::FolioResult;

/// Input for converting target weights into whole shares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationInput {
    pub weights: Vec<Rate>,
    pub prices: Vec<Money>,
    pub capital: Money,
}

/// Whole-share purchase plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationPlan {
    /// Shares bought per instrument
    pub shares: Vec<u64>,
    /// Cash spent per instrument (shares x price)
    pub spent: Vec<Money>,
    pub total_invested: Money,
    /// Capital left after the greedy fill; below the cheapest price
    pub leftover: Money,
}

/// Convert weights into integer share counts that exhaust as much capital
/// as possible.
///
/// Each instrument first receives `floor(weight * capital / price)` shares.
/// The remainder is then spent one share at a time on the cheapest
/// instrument whose price still fits, restarting the ascending-price scan
/// after every purchase, until the remainder is below the cheapest price.
///
/// Weights must be non-negative and sum to 1. Instruments with a
/// non-positive price receive no shares. A non-positive capital or an empty
/// selection buys nothing and leaves the capital as leftover. A share count
/// that does not fit in `u64` is a `FinancialImpossibility`.
#[allow(clippy::needless_range_loop)]
pub fn allocate_shares(
    weights: &[Rate],
    prices: &[Money],
    capital: Money,
) -> FolioResult<AllocationPlan> {
    if weights.len() != prices.len() {
        return Err(FolioError::InvalidInput {
            field: "weights".into(),
            reason: format!(
                "{} weights supplied for {} prices",
                weights.len(),
                prices.len()
            ),
        });
    }
    if !is_valid_weight_vector(weights) {
        return Err(FolioError::InvalidInput {
            field: "weights".into(),
            reason: "Weights must be non-negative and sum to 1".into(),
        });
    }

    let n = prices.len();
    let mut shares = vec![0u64; n];
    let mut spent = vec![Decimal::ZERO; n];

    if n == 0 || capital <= Decimal::ZERO {
        return Ok(AllocationPlan {
            shares,
            spent,
            total_invested: Decimal::ZERO,
            leftover: capital,
        });
    }

    for i in 0..n {
        let price = prices[i];
        if price <= Decimal::ZERO {
            continue;
        }
        let target = weights[i] * capital;
        let count = (target / price).floor().max(Decimal::ZERO);
        shares[i] = share_count(count, i)?;
        spent[i] = Decimal::from(shares[i]) * price;
    }

    let invested: Money = spent.iter().sum();
    let mut leftover = capital - invested;

    // The ascending scan always stops at the cheapest instrument while the
    // loop condition holds, so the one-share-at-a-time fill is a single
    // batch purchase of that instrument (lowest index on price ties).
    if let Some(cheapest) = cheapest_index(prices) {
        let price = prices[cheapest];
        if leftover >= price {
            let extra = (leftover / price).floor();
            let cost = extra * price;
            shares[cheapest] = shares[cheapest]
                .checked_add(share_count(extra, cheapest)?)
                .ok_or_else(|| share_overflow(cheapest))?;
            spent[cheapest] += cost;
            leftover -= cost;
        }
    }

    let total_invested: Money = spent.iter().sum();
    Ok(AllocationPlan {
        shares,
        spent,
        total_invested,
        leftover,
    })
}

fn share_count(count: Decimal, index: usize) -> FolioResult<u64> {
    count.to_u64().ok_or_else(|| share_overflow(index))
}

fn share_overflow(index: usize) -> FolioError {
    FolioError::FinancialImpossibility(format!(
        "Share count for instrument {index} exceeds the representable range"
    ))
}

/// Index of the lowest positive price; first occurrence wins ties.
fn cheapest_index(prices: &[Money]) -> Option<usize> {
    prices
        .iter()
        .enumerate()
        .filter(|(_, p)| **p > Decimal::ZERO)
        .fold(None, |best: Option<(usize, Money)>, (i, p)| match best {
            Some((_, bp)) if bp <= *p => best,
            _ => Some((i, *p)),
        })
        .map(|(i, _)| i)
}

/// Allocate with the standard computation envelope.
pub fn calculate_allocation(
    input: &AllocationInput,
) -> FolioResult<ComputationOutput<AllocationPlan>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let plan = allocate_shares(&input.weights, &input.prices, input.capital)?;

    if input.capital <= Decimal::ZERO {
        warnings.push("Capital is not positive: nothing was purchased".into());
    }
    let skipped = input.prices.iter().filter(|p| **p <= Decimal::ZERO).count();
    if skipped > 0 {
        warnings.push(format!(
            "{skipped} instrument(s) with a non-positive price received no shares"
        ));
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Whole-share allocation: floor(weight x capital / price), then cheapest-first fill",
        &serde_json::json!({
            "instruments": input.prices.len(),
            "capital": input.capital.to_string(),
        }),
        warnings,
        elapsed,
        plan,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Literal one-share-at-a-time fill used to check the batched version.
    fn stepwise(weights: &[Rate], prices: &[Money], capital: Money) -> (Vec<u64>, Money) {
        let mut shares: Vec<u64> = weights
            .iter()
            .zip(prices)
            .map(|(w, p)| (*w * capital / *p).floor().to_u64().unwrap())
            .collect();
        let mut leftover = capital
            - shares
                .iter()
                .zip(prices)
                .map(|(s, p)| Decimal::from(*s) * *p)
                .sum::<Decimal>();
        let mut order: Vec<usize> = (0..prices.len()).collect();
        order.sort_by(|a, b| prices[*a].cmp(&prices[*b]));
        let min_price = prices.iter().copied().min().unwrap();
        while leftover >= min_price {
            for &i in &order {
                if leftover >= prices[i] {
                    shares[i] += 1;
                    leftover -= prices[i];
                    break;
                }
            }
        }
        (shares, leftover)
    }

    #[test]
    fn test_single_instrument() {
        let plan = allocate_shares(&[dec!(1)], &[dec!(100)], dec!(1050)).unwrap();
        assert_eq!(plan.shares, vec![10]);
        assert_eq!(plan.spent, vec![dec!(1000)]);
        assert_eq!(plan.leftover, dec!(50));
    }

    #[test]
    fn test_two_instruments_no_fill_needed() {
        let plan =
            allocate_shares(&[dec!(0.5), dec!(0.5)], &[dec!(100), dec!(30)], dec!(1000)).unwrap();
        assert_eq!(plan.shares, vec![5, 16]);
        assert_eq!(plan.spent, vec![dec!(500), dec!(480)]);
        assert_eq!(plan.leftover, dec!(20));
    }

    #[test]
    fn test_fill_buys_cheapest() {
        // floor: [3, 10] -> spend 300 + 600 = 900, leftover 100 -> 1 more @ 60
        let plan =
            allocate_shares(&[dec!(0.35), dec!(0.65)], &[dec!(100), dec!(60)], dec!(1000)).unwrap();
        assert_eq!(plan.shares, vec![3, 11]);
        assert_eq!(plan.leftover, dec!(40));
    }

    #[test]
    fn test_matches_stepwise_fill() {
        let weights = vec![dec!(0.2), dec!(0.3), dec!(0.1), dec!(0.4)];
        let prices = vec![dec!(17.35), dec!(212.8), dec!(9.99), dec!(9.99)];
        for capital in [dec!(1000), dec!(2537.77), dec!(50000)] {
            let plan = allocate_shares(&weights, &prices, capital).unwrap();
            let (shares, leftover) = stepwise(&weights, &prices, capital);
            assert_eq!(plan.shares, shares);
            assert_eq!(plan.leftover, leftover);
        }
    }

    #[test]
    fn test_conservation_and_termination() {
        let weights = vec![dec!(0.25); 4];
        let prices = vec![dec!(1234.5), dec!(87.2), dec!(15.75), dec!(402)];
        let capital = dec!(100000);
        let plan = allocate_shares(&weights, &prices, capital).unwrap();
        let spent: Decimal = plan.spent.iter().sum();
        assert_eq!(spent + plan.leftover, capital);
        assert_eq!(plan.total_invested, spent);
        assert!(plan.leftover < dec!(15.75));
        assert!(plan.leftover >= Decimal::ZERO);
        for (i, s) in plan.shares.iter().enumerate() {
            assert_eq!(plan.spent[i], Decimal::from(*s) * prices[i]);
        }
    }

    #[test]
    fn test_deterministic() {
        let weights = vec![dec!(0.6), dec!(0.4)];
        let prices = vec![dec!(33.3), dec!(71.9)];
        let a = allocate_shares(&weights, &prices, dec!(5000)).unwrap();
        let b = allocate_shares(&weights, &prices, dec!(5000)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_degenerate_inputs() {
        let plan = allocate_shares(&[], &[], dec!(1000)).unwrap();
        assert!(plan.shares.is_empty());
        assert_eq!(plan.leftover, dec!(1000));

        let plan = allocate_shares(&[dec!(1)], &[dec!(10)], dec!(0)).unwrap();
        assert_eq!(plan.shares, vec![0]);
        assert_eq!(plan.leftover, dec!(0));

        let plan =
            allocate_shares(&[dec!(0.5), dec!(0.5)], &[dec!(0), dec!(-5)], dec!(100)).unwrap();
        assert_eq!(plan.shares, vec![0, 0]);
        assert_eq!(plan.leftover, dec!(100));
    }

    #[test]
    fn test_length_mismatch() {
        assert!(allocate_shares(&[dec!(1)], &[dec!(10), dec!(20)], dec!(100)).is_err());
    }

    #[test]
    fn test_rejects_weights_not_summing_to_one() {
        let err = allocate_shares(&[dec!(1), dec!(1)], &[dec!(10), dec!(10)], dec!(100));
        assert!(matches!(err, Err(FolioError::InvalidInput { .. })));

        let err = allocate_shares(&[dec!(0.3), dec!(0.2)], &[dec!(10), dec!(10)], dec!(100));
        assert!(matches!(err, Err(FolioError::InvalidInput { .. })));
    }

    #[test]
    fn test_rejects_negative_weights() {
        let err = allocate_shares(&[dec!(1.5), dec!(-0.5)], &[dec!(10), dec!(10)], dec!(100));
        assert!(matches!(err, Err(FolioError::InvalidInput { .. })));
    }

    #[test]
    fn test_envelope_propagates_invalid_weights() {
        let input = AllocationInput {
            weights: vec![dec!(0.7), dec!(0.7)],
            prices: vec![dec!(10), dec!(20)],
            capital: dec!(1000),
        };
        assert!(calculate_allocation(&input).is_err());
    }

    #[test]
    fn test_share_count_overflow_is_an_error() {
        // 1e16 / 0.0001 = 1e20 shares, past u64::MAX
        let err = allocate_shares(&[dec!(1)], &[dec!(0.0001)], dec!(10000000000000000));
        assert!(matches!(err, Err(FolioError::FinancialImpossibility(_))));
    }

    #[test]
    fn test_envelope_warnings() {
        let input = AllocationInput {
            weights: vec![dec!(0.5), dec!(0.5)],
            prices: vec![dec!(10), dec!(0)],
            capital: dec!(100),
        };
        let out = calculate_allocation(&input).unwrap();
        assert_eq!(out.result.shares, vec![10, 0]);
        assert_eq!(out.warnings.len(), 1);
    }
}
