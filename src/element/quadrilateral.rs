use crate::element::{isoparametric_jacobian, isoparametric_map};
use crate::quadrature::ReferenceCell;
use crate::Real;
use nalgebra::{Matrix2, Point2, Scalar, Vector2};
use numeric_literals::replace_float_literals;

/// A finite element representing bilinear basis functions on a quadrilateral, in two dimensions.
///
/// The reference element is `[-1, 1]^2`, with vertices ordered counter-clockwise starting at
/// `(-1, -1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad4d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 4],
}

impl<T> Quad4d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 4]) -> Self {
        Self { vertices }
    }

    pub fn vertices(&self) -> &[Point2<T>; 4] {
        &self.vertices
    }
}

impl<T> Quad4d2Element<T>
where
    T: Real,
{
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn reference() -> Self {
        Self::from_vertices([
            Point2::new(-1.0, -1.0),
            Point2::new(1.0, -1.0),
            Point2::new(1.0, 1.0),
            Point2::new(-1.0, 1.0),
        ])
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn evaluate_basis(&self, xi: &Point2<T>) -> [T; 4] {
        // N_{alpha, beta}([alpha, beta]) = 1 with alpha, beta = 1 or -1
        let phi = |alpha, beta, xi: &Point2<T>| (1.0 + alpha * xi[0]) * (1.0 + beta * xi[1]) / 4.0;
        [
            phi(-1.0, -1.0, xi),
            phi( 1.0, -1.0, xi),
            phi( 1.0,  1.0, xi),
            phi(-1.0,  1.0, xi),
        ]
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    pub fn gradients(&self, xi: &Point2<T>) -> [Vector2<T>; 4] {
        let phi_grad = |alpha, beta, xi: &Point2<T>|
            Vector2::new(
                alpha * (1.0 + beta * xi[1]) / 4.0,
                beta * (1.0 + alpha * xi[0]) / 4.0,
            );
        [
            phi_grad(-1.0, -1.0, xi),
            phi_grad( 1.0, -1.0, xi),
            phi_grad( 1.0,  1.0, xi),
            phi_grad(-1.0,  1.0, xi),
        ]
    }

    pub fn jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        isoparametric_jacobian(&self.vertices, &self.gradients(xi))
    }

    pub fn map(&self, xi: &Point2<T>) -> Point2<T> {
        isoparametric_map(&self.vertices, &self.evaluate_basis(xi))
    }
}

impl_fixed_nodes_element_2d!(Quad4d2Element, 4, ReferenceCell::Quadrilateral);

/// A finite element representing biquadratic basis functions on a quadrilateral, in two
/// dimensions.
///
/// Nodes 0-3 are the vertices, 4-7 the edge midpoints (edge 0-1 first) and 8 the center.
/// The geometry is taken to be straight-sided, i.e. the map to physical space is the bilinear
/// map defined by the four vertices.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Quad9d2Element<T>
where
    T: Scalar,
{
    vertices: [Point2<T>; 9],
    // Store quad for easy computation of Jacobians and mapping reference coordinates
    quad: Quad4d2Element<T>,
}

impl<T> Quad9d2Element<T>
where
    T: Scalar,
{
    pub fn from_vertices(vertices: [Point2<T>; 9]) -> Self {
        let v = &vertices;
        let quad = [v[0].clone(), v[1].clone(), v[2].clone(), v[3].clone()];
        Self {
            vertices,
            quad: Quad4d2Element::from_vertices(quad),
        }
    }

    pub fn vertices(&self) -> &[Point2<T>; 9] {
        &self.vertices
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    let c = 1.0 - alpha2;
    a * xi * xi + b * xi + c
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn quad9_phi_grad_1d<T: Real>(alpha: T, xi: T) -> T {
    let alpha2 = alpha * alpha;
    let a = (3.0 / 2.0) * alpha2 - 1.0;
    let b = alpha / 2.0;
    2.0 * a * xi + b
}

/// Reference coordinates of the nodes of the biquadratic quadrilateral.
const QUAD9_NODES: [(f64, f64); 9] = [
    (-1.0, -1.0),
    (1.0, -1.0),
    (1.0, 1.0),
    (-1.0, 1.0),
    (0.0, -1.0),
    (1.0, 0.0),
    (0.0, 1.0),
    (-1.0, 0.0),
    (0.0, 0.0),
];

impl<T> Quad9d2Element<T>
where
    T: Real,
{
    pub fn reference() -> Self {
        Self::from_vertices(QUAD9_NODES.map(|(x, y)| Point2::new(node_coord(x), node_coord(y))))
    }

    /// Evaluates the basis as the product `N_alpha(xi) N_beta(eta)` of 1D quadratic
    /// Lagrange polynomials.
    pub fn evaluate_basis(&self, xi: &Point2<T>) -> [T; 9] {
        QUAD9_NODES.map(|(alpha, beta)| {
            let (alpha, beta) = (node_coord(alpha), node_coord(beta));
            quad9_phi_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1])
        })
    }

    pub fn gradients(&self, xi: &Point2<T>) -> [Vector2<T>; 9] {
        QUAD9_NODES.map(|(alpha, beta)| {
            let (alpha, beta) = (node_coord(alpha), node_coord(beta));
            Vector2::new(
                quad9_phi_grad_1d(alpha, xi[0]) * quad9_phi_1d(beta, xi[1]),
                quad9_phi_1d(alpha, xi[0]) * quad9_phi_grad_1d(beta, xi[1]),
            )
        })
    }

    pub fn jacobian(&self, xi: &Point2<T>) -> Matrix2<T> {
        self.quad.jacobian(xi)
    }

    pub fn map(&self, xi: &Point2<T>) -> Point2<T> {
        self.quad.map(xi)
    }
}

fn node_coord<T: Real>(coord: f64) -> T {
    nalgebra::convert(coord)
}

impl_fixed_nodes_element_2d!(Quad9d2Element, 9, ReferenceCell::Quadrilateral);
