//! Quadrature rules for quadrilaterals and hexahedra, formed as tensor products of
//! one-dimensional Gauss rules.
//!
//! Points are ordered with the first coordinate varying slowest.

use crate::univariate::try_gauss;
use crate::{gauss_points_for_degree, Error, Rule};

/// A Gauss rule for the reference quadrilateral `[-1, 1]^2` with the given number of points
/// per dimension.
pub fn try_quadrilateral_gauss(num_points_per_dim: usize) -> Result<Rule<2>, Error> {
    let (w1d, x1d) = try_gauss(num_points_per_dim)?;
    let n = w1d.len();
    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);
    for (wx, [x]) in w1d.iter().zip(&x1d) {
        for (wy, [y]) in w1d.iter().zip(&x1d) {
            weights.push(wx * wy);
            points.push([*x, *y]);
        }
    }
    Ok((weights, points))
}

/// A Gauss rule for the reference hexahedron `[-1, 1]^3` with the given number of points
/// per dimension.
pub fn try_hexahedron_gauss(num_points_per_dim: usize) -> Result<Rule<3>, Error> {
    let (w1d, x1d) = try_gauss(num_points_per_dim)?;
    let n = w1d.len();
    let mut weights = Vec::with_capacity(n * n * n);
    let mut points = Vec::with_capacity(n * n * n);
    for (wx, [x]) in w1d.iter().zip(&x1d) {
        for (wy, [y]) in w1d.iter().zip(&x1d) {
            for (wz, [z]) in w1d.iter().zip(&x1d) {
                weights.push(wx * wy * wz);
                points.push([*x, *y, *z]);
            }
        }
    }
    Ok((weights, points))
}

/// The smallest tensor Gauss rule on the reference quadrilateral that integrates every
/// polynomial of total degree `degree` exactly.
pub fn quadrilateral_gauss_for_degree(degree: usize) -> Result<Rule<2>, Error> {
    try_quadrilateral_gauss(gauss_points_for_degree(degree))
}

/// The smallest tensor Gauss rule on the reference hexahedron that integrates every
/// polynomial of total degree `degree` exactly.
pub fn hexahedron_gauss_for_degree(degree: usize) -> Result<Rule<3>, Error> {
    try_hexahedron_gauss(gauss_points_for_degree(degree))
}
