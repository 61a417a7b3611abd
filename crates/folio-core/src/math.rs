//! Small Decimal linear-algebra helpers shared by the estimators,
//! strategies and metrics.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::FolioError;
use crate::FolioResult;

/// Square root, zero for non-positive input.
pub(crate) fn sqrt_decimal(val: Decimal) -> Decimal {
    if val <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    val.sqrt().unwrap_or(Decimal::ZERO)
}

/// Dot product of two vectors.
pub(crate) fn vec_dot(a: &[Decimal], b: &[Decimal]) -> Decimal {
    a.iter().zip(b.iter()).map(|(x, y)| *x * *y).sum()
}

/// Matrix-vector multiplication: result_i = sum_j(mat[i][j] * v[j]).
#[cfg_attr(not(feature = "solvers"), allow(dead_code))]
pub(crate) fn mat_vec_multiply(mat: &[Vec<Decimal>], v: &[Decimal]) -> Vec<Decimal> {
    mat.iter().map(|row| vec_dot(row, v)).collect()
}

/// Quadratic form w' * M * w.
pub(crate) fn quadratic_form(w: &[Decimal], mat: &[Vec<Decimal>]) -> Decimal {
    let mw = mat_vec_multiply(mat, w);
    vec_dot(w, &mw)
}

/// Equal weights for n assets. Empty for n == 0.
pub(crate) fn equal_weights(n: usize) -> Vec<Decimal> {
    if n == 0 {
        return Vec::new();
    }
    let w = Decimal::ONE / Decimal::from(n as i64);
    vec![w; n]
}

/// Scale weights in place so they sum to 1. Leaves an all-zero vector untouched.
#[cfg_attr(not(feature = "solvers"), allow(dead_code))]
pub(crate) fn normalize_weights(w: &mut [Decimal]) {
    let total: Decimal = w.iter().sum();
    if !total.is_zero() {
        for wi in w.iter_mut() {
            *wi /= total;
        }
    }
}

/// Matrix inverse via Gauss-Jordan elimination with partial pivoting.
#[allow(clippy::needless_range_loop)]
#[cfg_attr(not(feature = "solvers"), allow(dead_code))]
pub(crate) fn mat_inverse(mat: &[Vec<Decimal>]) -> FolioResult<Vec<Vec<Decimal>>> {
    let n = mat.len();
    let mut aug: Vec<Vec<Decimal>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut row = Vec::with_capacity(2 * n);
        row.extend_from_slice(&mat[i]);
        for j in 0..n {
            row.push(if i == j { Decimal::ONE } else { Decimal::ZERO });
        }
        aug.push(row);
    }

    for col in 0..n {
        let mut max_row = col;
        let mut max_val = aug[col][col].abs();
        for row in (col + 1)..n {
            let val = aug[row][col].abs();
            if val > max_val {
                max_val = val;
                max_row = row;
            }
        }
        if max_val.is_zero() {
            return Err(FolioError::FinancialImpossibility(
                "Covariance matrix is singular (not invertible)".into(),
            ));
        }
        if max_row != col {
            aug.swap(max_row, col);
        }

        let pivot = aug[col][col];
        for j in 0..(2 * n) {
            aug[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = aug[row][col];
            if factor.is_zero() {
                continue;
            }
            for j in 0..(2 * n) {
                let val = aug[col][j] * factor;
                aug[row][j] -= val;
            }
        }
    }

    Ok((0..n).map(|i| aug[i][n..(2 * n)].to_vec()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sqrt_guards() {
        assert_eq!(sqrt_decimal(dec!(-4)), Decimal::ZERO);
        assert_eq!(sqrt_decimal(Decimal::ZERO), Decimal::ZERO);
        assert!((sqrt_decimal(dec!(0.04)) - dec!(0.2)).abs() < dec!(0.0000000001));
    }

    #[test]
    fn test_quadratic_form() {
        let m = vec![vec![dec!(2), dec!(1)], vec![dec!(1), dec!(3)]];
        let w = vec![dec!(1), dec!(2)];
        // [1 2] * [[2 1][1 3]] * [1 2]' = 2 + 2*1*2 + 3*4 = 18
        assert_eq!(quadratic_form(&w, &m), dec!(18));
    }

    #[test]
    fn test_equal_weights_sum_to_one() {
        let w = equal_weights(3);
        let total: Decimal = w.iter().sum();
        assert!((total - Decimal::ONE).abs() < dec!(0.000000001));
        assert!(equal_weights(0).is_empty());
    }

    #[test]
    fn test_inverse_of_diagonal() {
        let m = vec![vec![dec!(4), dec!(0)], vec![dec!(0), dec!(0.5)]];
        let inv = mat_inverse(&m).unwrap();
        assert_eq!(inv[0][0], dec!(0.25));
        assert_eq!(inv[1][1], dec!(2));
        assert_eq!(inv[0][1], Decimal::ZERO);
    }

    #[test]
    fn test_inverse_singular() {
        let m = vec![vec![dec!(1), dec!(2)], vec![dec!(2), dec!(4)]];
        assert!(mat_inverse(&m).is_err());
    }

    #[test]
    fn test_normalize_all_zero_untouched() {
        let mut w = vec![Decimal::ZERO, Decimal::ZERO];
        normalize_weights(&mut w);
        assert_eq!(w, vec![Decimal::ZERO, Decimal::ZERO]);
    }
}
