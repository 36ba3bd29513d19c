use super::monomial_integral_1d;
use mixfem_quadrature::integrate;
use mixfem_quadrature::univariate::{gauss, gauss_for_degree, try_gauss};
use mixfem_quadrature::{Error, MAX_POINTS_PER_DIM};

use matrixcompare::assert_scalar_eq;

#[test]
fn gauss_rules_integrate_monomials_exactly() {
    for n in 1..=MAX_POINTS_PER_DIM {
        let rule = gauss(n);
        assert_eq!(rule.0.len(), n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=(2 * n - 1) as i32 {
            let estimated = integrate(&rule, |&[x]| x.powi(alpha));
            assert_scalar_eq!(estimated, monomial_integral_1d(alpha), comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn gauss_points_are_sorted_and_symmetric() {
    for n in 1..=20 {
        let (weights, points) = gauss(n);
        for i in 1..n {
            assert!(points[i - 1][0] < points[i][0]);
        }
        for i in 0..n {
            assert_scalar_eq!(points[i][0], -points[n - 1 - i][0], comp = abs, tol = 1e-15);
            assert_scalar_eq!(weights[i], weights[n - 1 - i], comp = abs, tol = 1e-15);
        }
    }
}

#[test]
fn gauss_rules_are_deterministic() {
    assert_eq!(gauss(7), gauss(7));
}

#[test]
fn unavailable_gauss_rules_are_reported() {
    assert_eq!(try_gauss(0), Err(Error::NoRuleAvailable));
    assert_eq!(try_gauss(MAX_POINTS_PER_DIM + 1), Err(Error::NoRuleAvailable));
}

#[test]
fn gauss_for_degree_uses_fewest_points() {
    assert_eq!(gauss_for_degree(0).unwrap().0.len(), 1);
    assert_eq!(gauss_for_degree(1).unwrap().0.len(), 1);
    assert_eq!(gauss_for_degree(2).unwrap().0.len(), 2);
    assert_eq!(gauss_for_degree(3).unwrap().0.len(), 2);
    assert_eq!(gauss_for_degree(5).unwrap().0.len(), 3);
}
