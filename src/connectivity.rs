//! Element connectivities: node lists, sides and node subsets per basis order.
use crate::element::{Lagrange2dElement, Quad4d2Element, Quad9d2Element, Tri3d2Element, Tri6d2Element};
use crate::fields::BasisOrder;
use crate::quadrature::ReferenceCell;
use crate::Real;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};
use std::ops::{Deref, DerefMut};

pub trait Connectivity: Clone {
    fn reference_cell(&self) -> ReferenceCell;

    fn vertex_indices(&self) -> &[usize];

    fn num_sides(&self) -> usize;

    /// Element-local indices of the nodes on the given side.
    fn side_local_nodes(&self, side: usize) -> Option<&'static [usize]>;

    /// Element-local indices of the nodes carrying the basis functions of the given order,
    /// in local basis order. Returns `None` if the order is not supported.
    fn lagrange_nodes(&self, order: BasisOrder) -> Option<&'static [usize]>;
}

pub trait ConnectivityMut: Connectivity {
    fn vertex_indices_mut(&mut self) -> &mut [usize];
}

/// A connectivity that can construct finite elements of a given basis order.
pub trait ElementConnectivity<T: Real>: Connectivity {
    type Element;

    /// Constructs the element of the given basis order from the mesh vertices.
    ///
    /// Returns `None` if the order is not supported or a vertex index is out of bounds.
    fn element(&self, order: BasisOrder, vertices: &[Point2<T>]) -> Option<Self::Element>;
}

fn gather<const N: usize, T: Real>(indices: &[usize], vertices: &[Point2<T>]) -> Option<[Point2<T>; N]> {
    let mut result = [Point2::origin(); N];
    for (x, &index) in result.iter_mut().zip(indices) {
        *x = *vertices.get(index)?;
    }
    Some(result)
}

macro_rules! impl_connectivity {
    ($connectivity:ident, $n:expr, $cell:expr, sides: $sides:expr, first: $first:expr, second: $second:expr) => {
        impl Connectivity for $connectivity {
            fn reference_cell(&self) -> ReferenceCell {
                $cell
            }

            fn vertex_indices(&self) -> &[usize] {
                &self.0
            }

            fn num_sides(&self) -> usize {
                const SIDES: &[&[usize]] = $sides;
                SIDES.len()
            }

            fn side_local_nodes(&self, side: usize) -> Option<&'static [usize]> {
                const SIDES: &[&[usize]] = $sides;
                SIDES.get(side).copied()
            }

            fn lagrange_nodes(&self, order: BasisOrder) -> Option<&'static [usize]> {
                const FIRST: Option<&[usize]> = $first;
                const SECOND: Option<&[usize]> = $second;
                match order {
                    BasisOrder::First => FIRST,
                    BasisOrder::Second => SECOND,
                }
            }
        }

        impl ConnectivityMut for $connectivity {
            fn vertex_indices_mut(&mut self) -> &mut [usize] {
                &mut self.0
            }
        }

        impl Deref for $connectivity {
            type Target = [usize; $n];

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $connectivity {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

/// Connectivity for a two-dimensional Tri3 element.
///
/// ```text
/// 2
/// | \
/// |   \
/// 0 --- 1
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri3d2Connectivity(pub [usize; 3]);

impl_connectivity!(Tri3d2Connectivity, 3, ReferenceCell::Triangle,
    sides: &[&[0, 1], &[1, 2], &[2, 0]],
    first: Some(&[0, 1, 2]),
    second: None);

/// Connectivity for a two-dimensional Tri6 element.
///
/// ```text
/// 2
/// | \
/// 5   4
/// |     \
/// 0--3--1
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tri6d2Connectivity(pub [usize; 6]);

impl_connectivity!(Tri6d2Connectivity, 6, ReferenceCell::Triangle,
    sides: &[&[0, 1, 3], &[1, 2, 4], &[2, 0, 5]],
    first: Some(&[0, 1, 2]),
    second: Some(&[0, 1, 2, 3, 4, 5]));

/// Connectivity for a two-dimensional Quad4 element.
///
/// ```text
/// 3____2
/// |    |
/// |____|
/// 0    1
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad4d2Connectivity(pub [usize; 4]);

impl_connectivity!(Quad4d2Connectivity, 4, ReferenceCell::Quadrilateral,
    sides: &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]],
    first: Some(&[0, 1, 2, 3]),
    second: None);

/// Connectivity for a two-dimensional Quad9 element.
///
/// A Quad9 element has a quadrilateral geometry, with 9 nodes evenly distributed across
/// the surface of the reference element [-1, 1]^2. Its vertices alone define a Quad4 element,
/// which carries first order fields.
///
/// ```text
/// 3____6____2
/// |         |
/// 7    8    5
/// |         |
/// 0____4____1
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quad9d2Connectivity(pub [usize; 9]);

impl_connectivity!(Quad9d2Connectivity, 9, ReferenceCell::Quadrilateral,
    sides: &[&[0, 1, 4], &[1, 2, 5], &[2, 3, 6], &[3, 0, 7]],
    first: Some(&[0, 1, 2, 3]),
    second: Some(&[0, 1, 2, 3, 4, 5, 6, 7, 8]));

impl<T: Real> ElementConnectivity<T> for Tri3d2Connectivity {
    type Element = Lagrange2dElement<T>;

    fn element(&self, order: BasisOrder, vertices: &[Point2<T>]) -> Option<Self::Element> {
        match order {
            BasisOrder::First => Some(Lagrange2dElement::Tri3(Tri3d2Element::from_vertices(gather(&self.0, vertices)?))),
            BasisOrder::Second => None,
        }
    }
}

impl<T: Real> ElementConnectivity<T> for Tri6d2Connectivity {
    type Element = Lagrange2dElement<T>;

    fn element(&self, order: BasisOrder, vertices: &[Point2<T>]) -> Option<Self::Element> {
        match order {
            BasisOrder::First => Some(Lagrange2dElement::Tri3(Tri3d2Element::from_vertices(gather(&self.0, vertices)?))),
            BasisOrder::Second => Some(Lagrange2dElement::Tri6(Tri6d2Element::from_vertices(gather(&self.0, vertices)?))),
        }
    }
}

impl<T: Real> ElementConnectivity<T> for Quad4d2Connectivity {
    type Element = Lagrange2dElement<T>;

    fn element(&self, order: BasisOrder, vertices: &[Point2<T>]) -> Option<Self::Element> {
        match order {
            BasisOrder::First => Some(Lagrange2dElement::Quad4(Quad4d2Element::from_vertices(gather(&self.0, vertices)?))),
            BasisOrder::Second => None,
        }
    }
}

impl<T: Real> ElementConnectivity<T> for Quad9d2Connectivity {
    type Element = Lagrange2dElement<T>;

    fn element(&self, order: BasisOrder, vertices: &[Point2<T>]) -> Option<Self::Element> {
        match order {
            BasisOrder::First => Some(Lagrange2dElement::Quad4(Quad4d2Element::from_vertices(gather(&self.0, vertices)?))),
            BasisOrder::Second => Some(Lagrange2dElement::Quad9(Quad9d2Element::from_vertices(gather(&self.0, vertices)?))),
        }
    }
}
