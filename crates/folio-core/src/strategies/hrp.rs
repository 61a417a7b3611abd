use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{StrategyKind, WeightStrategy, WeightVector};
use crate::estimation::covariance::correlation_from_covariance;
use crate::math::{equal_weights, normalize_weights, quadratic_form, sqrt_decimal};
use crate::types::*;
use crate::FolioResult;

/// Hierarchical risk parity (López de Prado).
///
/// 1. Distance `d_ij = sqrt((1 - ρ_ij) / 2)` from the implied correlations.
/// 2. Single-linkage agglomerative clustering, leaves read off in tree order.
/// 3. Recursive bisection of that order, splitting capital between halves
///    in inverse proportion to each half's inverse-variance cluster variance.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalRiskParity;

impl WeightStrategy for HierarchicalRiskParity {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RiskParity
    }

    fn compute(&self, _returns: &[Rate], covariance: &[Vec<Decimal>]) -> FolioResult<WeightVector> {
        let n = covariance.len();
        if n <= 1 {
            return Ok(equal_weights(n));
        }

        let corr = correlation_from_covariance(covariance);
        let dist: Vec<Vec<Decimal>> = corr
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| sqrt_decimal((Decimal::ONE - *c).max(Decimal::ZERO) / dec!(2)))
                    .collect()
            })
            .collect();

        let order = seriation(&dist);
        let mut weights = vec![Decimal::ONE; n];
        recursive_bisect(&order, covariance, &mut weights);
        normalize_weights(&mut weights);
        Ok(weights)
    }
}

/// Leaf order of a single-linkage dendrogram.
#[allow(clippy::needless_range_loop)]
fn seriation(dist: &[Vec<Decimal>]) -> Vec<usize> {
    let n = dist.len();
    if n <= 1 {
        return (0..n).collect();
    }

    let mut left_child: Vec<usize> = Vec::with_capacity(n - 1);
    let mut right_child: Vec<usize> = Vec::with_capacity(n - 1);
    let mut active = vec![true; n];
    let mut d = dist.to_vec();
    let mut node_id: Vec<usize> = (0..n).collect();

    for step in 0..(n - 1) {
        let mut best: Option<(Decimal, usize, usize)> = None;
        for i in 0..n {
            if !active[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !active[j] {
                    continue;
                }
                if best.map_or(true, |(min_d, _, _)| d[i][j] < min_d) {
                    best = Some((d[i][j], i, j));
                }
            }
        }
        let Some((_, mi, mj)) = best else { break };

        left_child.push(node_id[mi]);
        right_child.push(node_id[mj]);
        node_id[mi] = n + step;
        active[mj] = false;

        for k in 0..n {
            if !active[k] || k == mi {
                continue;
            }
            d[mi][k] = d[mi][k].min(d[mj][k]);
            d[k][mi] = d[mi][k];
        }
    }

    let mut order = Vec::with_capacity(n);
    collect_leaves(2 * n - 2, n, &left_child, &right_child, &mut order);
    order
}

fn collect_leaves(node: usize, n: usize, left: &[usize], right: &[usize], out: &mut Vec<usize>) {
    if node < n {
        out.push(node);
    } else {
        let idx = node - n;
        collect_leaves(left[idx], n, left, right, out);
        collect_leaves(right[idx], n, left, right, out);
    }
}

fn recursive_bisect(order: &[usize], cov: &[Vec<Decimal>], weights: &mut [Decimal]) {
    if order.len() <= 1 {
        return;
    }

    let (left, right) = order.split_at(order.len() / 2);
    let var_left = cluster_variance(left, cov);
    let var_right = cluster_variance(right, cov);

    let denom = var_left + var_right;
    let alpha = if denom.is_zero() {
        dec!(0.5)
    } else {
        Decimal::ONE - var_left / denom
    };

    for &i in left {
        weights[i] *= alpha;
    }
    for &i in right {
        weights[i] *= Decimal::ONE - alpha;
    }

    recursive_bisect(left, cov, weights);
    recursive_bisect(right, cov, weights);
}

/// Variance of the inverse-variance portfolio over `indices`.
fn cluster_variance(indices: &[usize], cov: &[Vec<Decimal>]) -> Decimal {
    let inv_vars: Vec<Decimal> = indices
        .iter()
        .map(|&i| {
            let v = cov[i][i];
            if v > Decimal::ZERO {
                Decimal::ONE / v
            } else {
                Decimal::ZERO
            }
        })
        .collect();
    let total: Decimal = inv_vars.iter().sum();
    if total.is_zero() {
        return Decimal::ZERO;
    }
    let w: Vec<Decimal> = inv_vars.iter().map(|iv| *iv / total).collect();
    let sub: Vec<Vec<Decimal>> = indices
        .iter()
        .map(|&i| indices.iter().map(|&j| cov[i][j]).collect())
        .collect();
    quadratic_form(&w, &sub)
}
