use crate::element::{isoparametric_jacobian, isoparametric_map};
use crate::quadrature::ReferenceCell;
use crate::Real;
use nalgebra::{Matrix2, Point2, Scalar, Vector2};
use numeric_literals::replace_float_literals;

/// A finite element representing linear basis functions on a triangle, in two dimensions.
///
/// The reference element is chosen to be the triangle defined by the corners
/// (-1, -1), (1, -1), (-1, 1), in agreement with the collapsed Gauss rules we employ.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri3d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 3],
}

impl<T> Tri3d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 3]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 3] {
        &self.vertices
    }
}

/// Barycentric coordinates of the reference triangle at `xi`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn barycentric<T: Real>(xi: &Point2<T>) -> [T; 3] {
    [-0.5 * (xi.x + xi.y), 0.5 * (xi.x + 1.0), 0.5 * (xi.y + 1.0)]
}

/// Reference gradients of the barycentric coordinates.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn barycentric_gradients<T: Real>() -> [Vector2<T>; 3] {
    [Vector2::new(-0.5, -0.5), Vector2::new(0.5, 0.0), Vector2::new(0.0, 0.5)]
}

impl<T> Tri3d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        Self::from_vertices([Point2::new(-1.0, -1.0), Point2::new(1.0, -1.0), Point2::new(-1.0, 1.0)])
    }

    pub fn evaluate_basis(&self, xi: &Point2<T>) -> [T; 3] {
        barycentric(xi)
    }

    pub fn gradients(&self, _: &Point2<T>) -> [Vector2<T>; 3] {
        barycentric_gradients()
    }

    pub fn jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        isoparametric_jacobian(&self.vertices, &self.gradients(xi))
    }

    pub fn map(&self, xi: &Point2<T>) -> Point2<T> {
        isoparametric_map(&self.vertices, &self.evaluate_basis(xi))
    }
}

impl_fixed_nodes_element_2d!(Tri3d2Element, 3, ReferenceCell::Triangle);

/// A finite element representing quadratic basis functions on a triangle, in two dimensions.
///
/// Nodes 0-2 are the corners, followed by the midpoints of the edges 0-1, 1-2 and 2-0.
/// The geometry is straight-sided, given by the affine map of the corners.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Tri6d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 6],
    tri3: Tri3d2Element<T>,
}

impl<T> Tri6d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 6]) -> Self {
        let v = &vertices;
        let tri = [v[0].clone(), v[1].clone(), v[2].clone()];
        Self {
            vertices,
            tri3: Tri3d2Element::from_vertices(tri),
        }
    }

    pub fn vertices(&self) -> &[Point2<T>; 6] {
        &self.vertices
    }
}

impl<T> Tri6d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(-1.0, 1.0),
            Point2::new(0.0, -1.0),
            Point2::new(0.0, 0.0),
            Point2::new(-1.0, 0.0),
        ])
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn evaluate_basis(&self, xi: &Point2<T>) -> [T; 6] {
        let [l0, l1, l2] = barycentric(xi);
        [
            l0 * (2.0 * l0 - 1.0),
            l1 * (2.0 * l1 - 1.0),
            l2 * (2.0 * l2 - 1.0),
            4.0 * l0 * l1,
            4.0 * l1 * l2,
            4.0 * l2 * l0,
        ]
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradients(&self, xi: &Point2<T>) -> [Vector2<T>; 6] {
        let [l0, l1, l2] = barycentric(xi);
        let [g0, g1, g2] = barycentric_gradients::<T>();
        [
            g0 * (4.0 * l0 - 1.0),
            g1 * (4.0 * l1 - 1.0),
            g2 * (4.0 * l2 - 1.0),
            (g0 * l1 + g1 * l0) * 4.0,
            (g1 * l2 + g2 * l1) * 4.0,
            (g2 * l0 + g0 * l2) * 4.0,
        ]
    }

    pub fn jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        self.tri3.jacobian(xi)
    }

    pub fn map(&self, xi: &Point2<T>) -> Point2<T> {
        self.tri3.map(xi)
    }
}

impl_fixed_nodes_element_2d!(Tri6d2Element, 6, ReferenceCell::Triangle);
