//! Quadrature rules for finite element reference cells.
//!
//! All rules are computed in double precision and returned as plain arrays, so that they can
//! be used independently of any linear algebra library. The reference cells are
//!
//! - the interval `[-1, 1]`,
//! - the quadrilateral `[-1, 1]^2` and the hexahedron `[-1, 1]^3`,
//! - the triangle with corners `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
//!
//! The ordering of points in a rule is deterministic and part of the contract: requesting
//! the same rule twice always produces the same sequence.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable => {
                write!(f, "There is no quadrature rule satisfying the requirements available")
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// The largest number of points per dimension that the Gauss generator is allowed to produce.
pub const MAX_POINTS_PER_DIM: usize = 64;

/// Number of Gauss points needed in one dimension to integrate polynomials of the given
/// degree exactly.
pub fn gauss_points_for_degree(degree: usize) -> usize {
    // n points integrate degree 2n - 1 exactly
    (degree + 2) / 2
}

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights.iter().zip(points).map(|(w, x)| w * f(x)).sum()
}
