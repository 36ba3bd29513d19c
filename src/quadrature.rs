//! Quadrature rules on reference cells.
//!
//! Rules are generated by the `mixfem-quadrature` crate in double precision and converted to
//! the scalar type of the assembly. A rule is immutable once constructed and is typically
//! shared between all elements and worker threads through an [`Arc`].
use crate::allocators::DimAllocator;
use crate::error::AssemblyError;
use crate::Real;
use itertools::izip;
use mixfem_quadrature::{simplex, tensor, univariate, Rule};
use nalgebra::{convert, DefaultAllocator, DimName, OPoint, OVector, Scalar};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use mixfem_quadrature::Error as QuadratureError;

/// The topology of a reference cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceCell {
    /// The interval `[-1, 1]`.
    Segment,
    /// The triangle with corners `(-1, -1)`, `(1, -1)` and `(-1, 1)`.
    Triangle,
    /// The square `[-1, 1]^2`.
    Quadrilateral,
    /// The cube `[-1, 1]^3`.
    Hexahedron,
}

impl ReferenceCell {
    pub fn dim(&self) -> usize {
        match self {
            Self::Segment => 1,
            Self::Triangle | Self::Quadrilateral => 2,
            Self::Hexahedron => 3,
        }
    }
}

pub trait Quadrature<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn weights(&self) -> &[T];
    fn points(&self) -> &[OPoint<T, D>];

    fn num_points(&self) -> usize {
        self.weights().len()
    }

    /// Approximates the integral of `f` over the reference cell.
    fn integrate<F>(&self, f: F) -> T
    where
        T: Real,
        F: Fn(&OPoint<T, D>) -> T,
    {
        izip!(self.weights(), self.points()).fold(T::zero(), |sum, (&w, x)| sum + w * f(x))
    }
}

/// A quadrature rule on a reference cell.
///
/// The ordering of points is deterministic: constructing the same rule twice yields the same
/// sequence of points and weights.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadratureRule<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    cell: ReferenceCell,
    degree: usize,
    weights: Vec<T>,
    points: Vec<OPoint<T, D>>,
}

impl<T, D> QuadratureRule<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Constructs a Gauss-type rule that integrates polynomials of the given degree exactly on
    /// the reference cell.
    ///
    /// Tensor cells use tensor products of Gauss-Legendre rules, the triangle uses a collapsed
    /// Gauss rule. A degree of zero is treated as degree one.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::Quadrature`] if the cell dimension does not match `D`, or if the
    /// degree requires more points than the generator supports.
    pub fn gauss(cell: ReferenceCell, degree: usize) -> eyre::Result<Self> {
        let degree = degree.max(1);
        let unavailable = || AssemblyError::Quadrature { cell, degree };
        if cell.dim() != D::dim() {
            return Err(unavailable().into());
        }

        let rule = match cell {
            ReferenceCell::Segment => univariate::gauss_for_degree(degree).map(convert_rule),
            ReferenceCell::Quadrilateral => tensor::quadrilateral_gauss_for_degree(degree).map(convert_rule),
            ReferenceCell::Triangle => simplex::triangle_collapsed_gauss_for_degree(degree).map(convert_rule),
            ReferenceCell::Hexahedron => tensor::hexahedron_gauss_for_degree(degree).map(convert_rule),
        };
        let (weights, points) = rule.map_err(|_| unavailable())?;

        Ok(Self {
            cell,
            degree,
            weights,
            points,
        })
    }

    /// Constructs a rule from explicit weights and points.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::DimensionMismatch`] if the number of weights and points differ.
    pub fn from_weights_and_points(
        cell: ReferenceCell,
        degree: usize,
        weights: Vec<T>,
        points: Vec<OPoint<T, D>>,
    ) -> eyre::Result<Self> {
        if weights.len() != points.len() {
            return Err(AssemblyError::DimensionMismatch {
                context: "quadrature rule",
                expected: weights.len(),
                actual: points.len(),
            }
            .into());
        }
        Ok(Self {
            cell,
            degree,
            weights,
            points,
        })
    }

    pub fn cell(&self) -> ReferenceCell {
        self.cell
    }

    /// The polynomial degree the rule integrates exactly.
    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl<T, D> Quadrature<T, D> for QuadratureRule<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn weights(&self) -> &[T] {
        &self.weights
    }

    fn points(&self) -> &[OPoint<T, D>] {
        &self.points
    }
}

fn convert_rule<T, D, const N: usize>((weights, points): Rule<N>) -> (Vec<T>, Vec<OPoint<T, D>>)
where
    T: Real,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    let weights = weights.into_iter().map(convert).collect();
    let points = points
        .iter()
        .map(|p| OPoint::from(OVector::<T, D>::from_iterator(p.iter().map(|&x| convert(x)))))
        .collect();
    (weights, points)
}

/// Shared quadrature rules, one per reference cell present in a mesh.
#[derive(Debug, Clone)]
pub struct QuadratureTable<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    rules: Vec<Arc<QuadratureRule<T, D>>>,
}

impl<T, D> QuadratureTable<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Constructs Gauss rules of the given degree for each of the given cells.
    pub fn gauss(cells: impl IntoIterator<Item = ReferenceCell>, degree: usize) -> eyre::Result<Self> {
        let mut cells: Vec<_> = cells.into_iter().collect();
        cells.sort_unstable();
        cells.dedup();
        let rules = cells
            .into_iter()
            .map(|cell| QuadratureRule::gauss(cell, degree).map(Arc::new))
            .collect::<eyre::Result<_>>()?;
        Ok(Self { rules })
    }

    pub fn rule_for(&self, cell: ReferenceCell) -> Option<&Arc<QuadratureRule<T, D>>> {
        self.rules.iter().find(|rule| rule.cell() == cell)
    }

    pub fn rules(&self) -> &[Arc<QuadratureRule<T, D>>] {
        &self.rules
    }
}
