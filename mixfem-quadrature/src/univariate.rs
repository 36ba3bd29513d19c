//! Quadrature rules for the reference interval `[-1, 1]`.

use crate::{gauss_points_for_degree, Error, Rule, MAX_POINTS_PER_DIM};
use std::f64::consts::PI;

const NEWTON_TOLERANCE: f64 = 1e-15;
const NEWTON_MAX_ITERATIONS: usize = 100;

/// Evaluates the Legendre polynomial `P_n` and its derivative at `x`.
///
/// The derivative formula is singular at `|x| == 1`, which is fine since all Gauss points
/// lie in the open interval.
fn legendre_with_derivative(n: usize, x: f64) -> (f64, f64) {
    // Bonnet's recursion: m P_m = (2m - 1) x P_{m-1} - (m - 1) P_{m-2}
    let (mut p_prev, mut p) = (0.0, 1.0);
    for m in 1..=n {
        let m = m as f64;
        let p_next = ((2.0 * m - 1.0) * x * p - (m - 1.0) * p_prev) / m;
        p_prev = p;
        p = p_next;
    }
    let dp = n as f64 * (x * p - p_prev) / (x * x - 1.0);
    (p, dp)
}

/// Gauss-Legendre quadrature with the given number of points.
///
/// A rule with `n` points integrates polynomials of degree up to `2n - 1` exactly.
/// Points are returned in ascending order.
///
/// Returns an error if zero points or more than [`MAX_POINTS_PER_DIM`] points are requested.
pub fn try_gauss(num_points: usize) -> Result<Rule<1>, Error> {
    let n = num_points;
    if n == 0 || n > MAX_POINTS_PER_DIM {
        return Err(Error::NoRuleAvailable);
    }

    let mut weights = vec![0.0; n];
    let mut points = vec![[0.0]; n];

    // Roots are symmetric about the origin, so we only solve for the positive half
    // and mirror the result.
    for i in 0..(n + 1) / 2 {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut converged = false;
        for _ in 0..NEWTON_MAX_ITERATIONS {
            let (p, dp) = legendre_with_derivative(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() <= NEWTON_TOLERANCE {
                converged = true;
                break;
            }
        }
        if !converged {
            return Err(Error::NoRuleAvailable);
        }
        let (_, dp) = legendre_with_derivative(n, x);
        let w = 2.0 / ((1.0 - x * x) * dp * dp);

        // x is the i-th largest root
        points[n - 1 - i] = [x];
        points[i] = [-x];
        weights[n - 1 - i] = w;
        weights[i] = w;
    }

    if n % 2 == 1 {
        // Guard against a tiny non-zero residual for the middle point
        points[n / 2] = [0.0];
    }

    Ok((weights, points))
}

/// Gauss-Legendre quadrature with the given number of points.
///
/// # Panics
///
/// Panics if no rule with the given number of points is available, see [`try_gauss`].
pub fn gauss(num_points: usize) -> Rule<1> {
    try_gauss(num_points).expect("No Gauss rule available for the requested number of points")
}

/// The Gauss-Legendre rule with the fewest points that integrates polynomials of the
/// given degree exactly.
pub fn gauss_for_degree(degree: usize) -> Result<Rule<1>, Error> {
    try_gauss(gauss_points_for_degree(degree))
}
