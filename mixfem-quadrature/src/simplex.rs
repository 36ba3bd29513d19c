//! Quadrature rules for the reference triangle with corners `(-1, -1)`, `(1, -1)`, `(-1, 1)`.

use crate::univariate::try_gauss;
use crate::{gauss_points_for_degree, Error, Rule};

/// A collapsed Gauss rule for the reference triangle.
///
/// The square `[-1, 1]^2` is mapped onto the triangle by the Duffy transform
///
/// ```text
/// x = (1 + a) (1 - b) / 2 - 1,    y = b,
/// ```
///
/// whose Jacobian determinant is `(1 - b) / 2`. A polynomial of total degree `k` becomes a
/// polynomial of degree `k` in `a` and `k + 1` in `b`, so the rule integrates total degree
/// `degree` exactly. Points are ordered with `a` varying slowest.
pub fn triangle_collapsed_gauss_for_degree(degree: usize) -> Result<Rule<2>, Error> {
    let (wa, a) = try_gauss(gauss_points_for_degree(degree))?;
    let (wb, b) = try_gauss(gauss_points_for_degree(degree + 1))?;

    let mut weights = Vec::with_capacity(wa.len() * wb.len());
    let mut points = Vec::with_capacity(wa.len() * wb.len());
    for (w_a, [a]) in wa.iter().zip(&a) {
        for (w_b, [b]) in wb.iter().zip(&b) {
            let x = 0.5 * (1.0 + a) * (1.0 - b) - 1.0;
            weights.push(w_a * w_b * 0.5 * (1.0 - b));
            points.push([x, *b]);
        }
    }
    Ok((weights, points))
}
