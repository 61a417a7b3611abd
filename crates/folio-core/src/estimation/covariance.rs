use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::FolioError;
use crate::math::sqrt_decimal;
use crate::types::*;
use crate::FolioResult;

/// Square covariance matrix indexed like the selected instruments.
pub type CovarianceMatrix = Vec<Vec<Decimal>>;

/// Uniform pairwise correlation assumed between any two instruments.
///
/// This is a modelling assumption, not an estimate: volatilities come from
/// the universe, correlations are not observed.
pub const CROSS_CORRELATION: Rate = dec!(0.3);

/// Covariance from volatilities with the default cross-correlation.
///
/// `C[i][i] = σi²`, `C[i][j] = σi·σj·ρ` for i != j.
pub fn build_covariance(volatilities: &[Rate]) -> CovarianceMatrix {
    build_covariance_with_correlation(volatilities, CROSS_CORRELATION)
}

/// Covariance from volatilities with an explicit uniform correlation.
pub fn build_covariance_with_correlation(volatilities: &[Rate], rho: Rate) -> CovarianceMatrix {
    volatilities
        .iter()
        .enumerate()
        .map(|(i, si)| {
            volatilities
                .iter()
                .enumerate()
                .map(|(j, sj)| if i == j { *si * *si } else { *si * *sj * rho })
                .collect()
        })
        .collect()
}

/// Correlation matrix implied by a covariance matrix. Pairs involving a
/// zero-variance instrument are treated as uncorrelated.
#[allow(clippy::needless_range_loop)]
pub fn correlation_from_covariance(cov: &[Vec<Decimal>]) -> CovarianceMatrix {
    let n = cov.len();
    let vols: Vec<Decimal> = (0..n).map(|i| sqrt_decimal(cov[i][i])).collect();
    let mut corr = vec![vec![Decimal::ZERO; n]; n];
    for i in 0..n {
        for j in 0..n {
            corr[i][j] = if i == j {
                Decimal::ONE
            } else if vols[i].is_zero() || vols[j].is_zero() {
                Decimal::ZERO
            } else {
                cov[i][j] / (vols[i] * vols[j])
            };
        }
    }
    corr
}

#[allow(clippy::needless_range_loop)]
pub fn validate_covariance_matrix(cov: &[Vec<Decimal>], n: usize) -> FolioResult<()> {
    if n == 0 || cov.is_empty() {
        return Err(FolioError::InvalidInput {
            field: "covariance_matrix".into(),
            reason: "Covariance matrix is empty".into(),
        });
    }
    if cov.len() != n {
        return Err(FolioError::InvalidInput {
            field: "covariance_matrix".into(),
            reason: format!("Expected {}x{} matrix but got {} rows", n, n, cov.len()),
        });
    }
    for (i, row) in cov.iter().enumerate() {
        if row.len() != n {
            return Err(FolioError::InvalidInput {
                field: "covariance_matrix".into(),
                reason: format!("Row {} has {} columns, expected {}", i, row.len(), n),
            });
        }
    }
    let tolerance = dec!(0.0000001);
    for i in 0..n {
        for j in (i + 1)..n {
            if (cov[i][j] - cov[j][i]).abs() > tolerance {
                return Err(FolioError::InvalidInput {
                    field: "covariance_matrix".into(),
                    reason: format!(
                        "Matrix is not symmetric: cov[{}][{}]={} != cov[{}][{}]={}",
                        i, j, cov[i][j], j, i, cov[j][i]
                    ),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_is_variance() {
        let cov = build_covariance(&[dec!(0.2), dec!(0.1), dec!(0.35)]);
        assert_eq!(cov[0][0], dec!(0.04));
        assert_eq!(cov[1][1], dec!(0.01));
        assert_eq!(cov[2][2], dec!(0.1225));
    }

    #[test]
    fn test_off_diagonal_discounted_and_symmetric() {
        let vols = [dec!(0.2), dec!(0.1), dec!(0.35)];
        let cov = build_covariance(&vols);
        assert_eq!(cov[0][1], dec!(0.006));
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(cov[i][j], cov[j][i]);
            }
        }
        assert!(validate_covariance_matrix(&cov, 3).is_ok());
    }

    #[test]
    fn test_size_matches_selection() {
        assert_eq!(build_covariance(&[dec!(0.1); 15]).len(), 15);
        assert!(build_covariance(&[]).is_empty());
    }

    #[test]
    fn test_correlation_round_trip() {
        let cov = build_covariance(&[dec!(0.2), dec!(0.4), dec!(0)]);
        let corr = correlation_from_covariance(&cov);
        assert_eq!(corr[0][0], Decimal::ONE);
        assert!((corr[0][1] - dec!(0.3)).abs() < dec!(0.0000001));
        assert_eq!(corr[0][2], Decimal::ZERO);
    }

    #[test]
    fn test_validation_failures() {
        assert!(validate_covariance_matrix(&[], 0).is_err());
        let ragged = vec![vec![dec!(1), dec!(0)], vec![dec!(0)]];
        assert!(validate_covariance_matrix(&ragged, 2).is_err());
        let asym = vec![vec![dec!(1), dec!(0.5)], vec![dec!(0.2), dec!(1)]];
        assert!(validate_covariance_matrix(&asym, 2).is_err());
    }
}
