//! Finite elements: reference bases and the geometric map to physical space.
use crate::allocators::DimAllocator;
use crate::quadrature::ReferenceCell;
use crate::Real;
use nalgebra::{DefaultAllocator, DimName, Dyn, Matrix2, OMatrix, OPoint, Point2, Scalar, Vector2, U2};

pub use quadrilateral::*;
pub use triangle::*;

/// A finite element on a reference cell, without knowledge of its physical geometry.
pub trait ReferenceFiniteElement<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// The number of nodes, and hence basis functions, of the element.
    fn num_nodes(&self) -> usize;

    /// Evaluates each basis function at the given reference coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `basis_values` does not have length [`num_nodes`](Self::num_nodes).
    fn populate_basis(&self, basis_values: &mut [T], reference_coords: &OPoint<T, D>);

    /// Computes the reference gradient of each basis function, stored column-wise.
    ///
    /// # Panics
    ///
    /// Panics if `basis_gradients` does not have [`num_nodes`](Self::num_nodes) columns.
    fn populate_basis_gradients(&self, basis_gradients: &mut OMatrix<T, D, Dyn>, reference_coords: &OPoint<T, D>);
}

/// A finite element whose reference cell is mapped to physical space.
pub trait FiniteElement<T, D>: ReferenceFiniteElement<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn reference_cell(&self) -> ReferenceCell;

    /// The Jacobian of the map from reference to physical coordinates.
    fn reference_jacobian(&self, reference_coords: &OPoint<T, D>) -> OMatrix<T, D, D>;

    fn map_reference_coords(&self, reference_coords: &OPoint<T, D>) -> OPoint<T, D>;
}

/// Two-dimensional Lagrange elements of first and second order.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Lagrange2dElement<T: Scalar> {
    Tri3(Tri3d2Element<T>),
    Tri6(Tri6d2Element<T>),
    Quad4(Quad4d2Element<T>),
    Quad9(Quad9d2Element<T>),
}

macro_rules! dispatch {
    ($self:ident, $element:ident => $expr:expr) => {
        match $self {
            Lagrange2dElement::Tri3($element) => $expr,
            Lagrange2dElement::Tri6($element) => $expr,
            Lagrange2dElement::Quad4($element) => $expr,
            Lagrange2dElement::Quad9($element) => $expr,
        }
    };
}

impl<T: Real> ReferenceFiniteElement<T, U2> for Lagrange2dElement<T> {
    fn num_nodes(&self) -> usize {
        dispatch!(self, element => element.num_nodes())
    }

    fn populate_basis(&self, basis_values: &mut [T], reference_coords: &Point2<T>) {
        dispatch!(self, element => element.populate_basis(basis_values, reference_coords))
    }

    fn populate_basis_gradients(&self, basis_gradients: &mut OMatrix<T, U2, Dyn>, reference_coords: &Point2<T>) {
        dispatch!(self, element => element.populate_basis_gradients(basis_gradients, reference_coords))
    }
}

impl<T: Real> FiniteElement<T, U2> for Lagrange2dElement<T> {
    fn reference_cell(&self) -> ReferenceCell {
        dispatch!(self, element => element.reference_cell())
    }

    fn reference_jacobian(&self, reference_coords: &Point2<T>) -> Matrix2<T> {
        dispatch!(self, element => element.reference_jacobian(reference_coords))
    }

    fn map_reference_coords(&self, reference_coords: &Point2<T>) -> Point2<T> {
        dispatch!(self, element => element.map_reference_coords(reference_coords))
    }
}

/// Implements the element traits for a 2D element with a fixed number of nodes, given
/// inherent `evaluate_basis`, `gradients`, `jacobian` and `map` methods.
macro_rules! impl_fixed_nodes_element_2d {
    ($element:ident, $num_nodes:expr, $cell:expr) => {
        impl<T: crate::Real> crate::element::ReferenceFiniteElement<T, nalgebra::U2> for $element<T> {
            fn num_nodes(&self) -> usize {
                $num_nodes
            }

            fn populate_basis(&self, basis_values: &mut [T], reference_coords: &nalgebra::Point2<T>) {
                basis_values.copy_from_slice(&self.evaluate_basis(reference_coords));
            }

            fn populate_basis_gradients(
                &self,
                basis_gradients: &mut nalgebra::OMatrix<T, nalgebra::U2, nalgebra::Dyn>,
                reference_coords: &nalgebra::Point2<T>,
            ) {
                assert_eq!(basis_gradients.ncols(), $num_nodes, "Gradient buffer must have one column per node");
                for (i, gradient) in self.gradients(reference_coords).iter().enumerate() {
                    basis_gradients.set_column(i, gradient);
                }
            }
        }

        impl<T: crate::Real> crate::element::FiniteElement<T, nalgebra::U2> for $element<T> {
            fn reference_cell(&self) -> crate::quadrature::ReferenceCell {
                $cell
            }

            fn reference_jacobian(&self, reference_coords: &nalgebra::Point2<T>) -> nalgebra::Matrix2<T> {
                self.jacobian(reference_coords)
            }

            fn map_reference_coords(&self, reference_coords: &nalgebra::Point2<T>) -> nalgebra::Point2<T> {
                self.map(reference_coords)
            }
        }
    };
}

/// Jacobian of an isoparametric map with the given nodes and reference gradients.
pub(crate) fn isoparametric_jacobian<T: Real>(vertices: &[Point2<T>], gradients: &[Vector2<T>]) -> Matrix2<T> {
    vertices
        .iter()
        .zip(gradients)
        .fold(Matrix2::zeros(), |j, (x, g)| j + x.coords * g.transpose())
}

/// Maps reference coordinates with an isoparametric map with the given nodes and basis values.
pub(crate) fn isoparametric_map<T: Real>(vertices: &[Point2<T>], basis_values: &[T]) -> Point2<T> {
    let x = vertices
        .iter()
        .zip(basis_values)
        .fold(Vector2::zeros(), |x, (v, &phi)| x + v.coords * phi);
    Point2::from(x)
}

mod quadrilateral;
mod triangle;
