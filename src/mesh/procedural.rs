//! Basic procedural mesh generation routines.
use crate::connectivity::{
    Connectivity, Quad4d2Connectivity, Quad9d2Connectivity, Tri3d2Connectivity, Tri6d2Connectivity,
};
use crate::mesh::{Mesh2d, Quad9Mesh2d, QuadMesh2d};
use crate::Real;
use nalgebra::{convert, Point2};

/// Connectivities that can tile a structured grid of rectangular cells.
pub trait StructuredConnectivity: Connectivity {
    /// The number of lattice intervals per cell and dimension: 1 for linear, 2 for quadratic
    /// elements.
    const LATTICE_STRIDE: usize;

    /// Appends the elements of the cell whose lower-left lattice node is `(i, j)`.
    ///
    /// `node` maps lattice coordinates to global node indices.
    fn push_cell(cells: &mut Vec<Self>, i: usize, j: usize, node: impl Fn(usize, usize) -> usize);
}

impl StructuredConnectivity for Quad4d2Connectivity {
    const LATTICE_STRIDE: usize = 1;

    fn push_cell(cells: &mut Vec<Self>, i: usize, j: usize, node: impl Fn(usize, usize) -> usize) {
        cells.push(Quad4d2Connectivity([
            node(i, j),
            node(i + 1, j),
            node(i + 1, j + 1),
            node(i, j + 1),
        ]));
    }
}

impl StructuredConnectivity for Quad9d2Connectivity {
    const LATTICE_STRIDE: usize = 2;

    fn push_cell(cells: &mut Vec<Self>, i: usize, j: usize, node: impl Fn(usize, usize) -> usize) {
        cells.push(Quad9d2Connectivity([
            node(i, j),
            node(i + 2, j),
            node(i + 2, j + 2),
            node(i, j + 2),
            node(i + 1, j),
            node(i + 2, j + 1),
            node(i + 1, j + 2),
            node(i, j + 1),
            node(i + 1, j + 1),
        ]));
    }
}

impl StructuredConnectivity for Tri3d2Connectivity {
    const LATTICE_STRIDE: usize = 1;

    fn push_cell(cells: &mut Vec<Self>, i: usize, j: usize, node: impl Fn(usize, usize) -> usize) {
        let (a, b, c, d) = (node(i, j), node(i + 1, j), node(i + 1, j + 1), node(i, j + 1));
        cells.push(Tri3d2Connectivity([a, b, c]));
        cells.push(Tri3d2Connectivity([a, c, d]));
    }
}

impl StructuredConnectivity for Tri6d2Connectivity {
    const LATTICE_STRIDE: usize = 2;

    fn push_cell(cells: &mut Vec<Self>, i: usize, j: usize, node: impl Fn(usize, usize) -> usize) {
        let (a, b, c, d) = (node(i, j), node(i + 2, j), node(i + 2, j + 2), node(i, j + 2));
        let center = node(i + 1, j + 1);
        cells.push(Tri6d2Connectivity([a, b, c, node(i + 1, j), node(i + 2, j + 1), center]));
        cells.push(Tri6d2Connectivity([a, c, d, center, node(i + 1, j + 2), node(i, j + 1)]));
    }
}

/// Generates a structured mesh of `cells_x` by `cells_y` rectangular cells covering the
/// axis-aligned rectangle spanned by `lower` and `upper`.
///
/// Quadrilateral connectivities produce one element per cell, triangle connectivities two
/// (split along the diagonal from the lower-left to the upper-right corner). Elements are
/// ordered row by row from the bottom, and all elements are counter-clockwise oriented.
/// If either cell count is zero, the mesh is empty.
pub fn create_rectangular_mesh_2d<T, C>(
    cells_x: usize,
    cells_y: usize,
    lower: &Point2<T>,
    upper: &Point2<T>,
) -> Mesh2d<T, C>
where
    T: Real,
    C: StructuredConnectivity,
{
    if cells_x == 0 || cells_y == 0 {
        return Mesh2d::from_vertices_and_connectivity(Vec::new(), Vec::new());
    }

    let stride = C::LATTICE_STRIDE;
    let intervals_x = stride * cells_x;
    let intervals_y = stride * cells_y;
    let extents = upper - lower;

    let mut vertices = Vec::with_capacity((intervals_x + 1) * (intervals_y + 1));
    for j in 0..=intervals_y {
        for i in 0..=intervals_x {
            let s: T = convert(i as f64 / intervals_x as f64);
            let t: T = convert(j as f64 / intervals_y as f64);
            vertices.push(Point2::new(lower.x + s * extents.x, lower.y + t * extents.y));
        }
    }

    let node = |i: usize, j: usize| (intervals_x + 1) * j + i;
    let mut cells = Vec::new();
    for cell_j in 0..cells_y {
        for cell_i in 0..cells_x {
            C::push_cell(&mut cells, stride * cell_i, stride * cell_j, node);
        }
    }

    Mesh2d::from_vertices_and_connectivity(vertices, cells)
}

pub fn create_unit_square_uniform_quad_mesh_2d<T: Real>(cells_per_dim: usize) -> QuadMesh2d<T> {
    create_rectangular_mesh_2d(cells_per_dim, cells_per_dim, &Point2::origin(), &Point2::new(T::one(), T::one()))
}

pub fn create_unit_square_uniform_quad9_mesh_2d<T: Real>(cells_per_dim: usize) -> Quad9Mesh2d<T> {
    create_rectangular_mesh_2d(cells_per_dim, cells_per_dim, &Point2::origin(), &Point2::new(T::one(), T::one()))
}
