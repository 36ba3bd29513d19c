//! Meshes as consumed by the assembly engine.
use crate::allocators::DimAllocator;
use crate::connectivity::{
    Connectivity, ElementConnectivity, Quad4d2Connectivity, Quad9d2Connectivity, Tri3d2Connectivity,
    Tri6d2Connectivity,
};
use crate::element::FiniteElement;
use crate::fields::BasisOrder;
use crate::quadrature::ReferenceCell;
use crate::Real;
use log::warn;
use nalgebra::{DefaultAllocator, DimName, OPoint, Scalar, U2};
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Display;

pub mod procedural;

/// The view of a mesh required by assembly.
///
/// Any mesh data structure can take part in assembly by implementing this trait. Elements are
/// identified by their index in `0 .. num_elements()`, nodes by their index in
/// `0 .. num_nodes()`. Element sides are numbered locally per element.
pub trait AssemblyMesh<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    type Element: FiniteElement<T, D>;

    fn num_nodes(&self) -> usize;

    fn num_elements(&self) -> usize;

    /// Whether the element takes part in assembly.
    fn is_active(&self, element_index: usize) -> bool;

    fn reference_cell(&self, element_index: usize) -> Option<ReferenceCell>;

    /// Global node indices of the element, in element-local order.
    fn element_nodes(&self, element_index: usize) -> Option<&[usize]>;

    fn node_position(&self, node_index: usize) -> Option<&OPoint<T, D>>;

    fn num_sides(&self, element_index: usize) -> usize;

    /// Element-local indices of the nodes on the given side of the element.
    fn side_local_nodes(&self, element_index: usize, side: usize) -> Option<&[usize]>;

    /// The element across the given side, or `None` if the side is on the domain boundary.
    fn neighbor(&self, element_index: usize, side: usize) -> Option<usize>;

    /// Element-local indices of the nodes that carry the basis functions of the given order,
    /// in local basis order. `None` if the element does not support the order.
    fn lagrange_nodes(&self, element_index: usize, order: BasisOrder) -> Option<&[usize]>;

    /// Constructs the finite element of the given basis order.
    fn element(&self, element_index: usize, order: BasisOrder) -> Option<Self::Element>;

    fn active_elements(&self) -> Vec<usize> {
        (0..self.num_elements())
            .filter(|&element_index| self.is_active(element_index))
            .collect()
    }
}

/// Index-based data structure for conforming meshes (i.e. no hanging nodes).
///
/// Neighbors across element sides are derived from the connectivity when the mesh is
/// constructed: two sides referring to the same set of nodes are neighbors, a side referenced
/// by a single element is on the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh<T: Scalar, D, Connectivity>
where
    D: DimName,
    DefaultAllocator: DimAllocator<T, D>,
{
    vertices: Vec<OPoint<T, D>>,
    connectivity: Vec<Connectivity>,
    neighbors: Vec<Vec<Option<usize>>>,
    active: Vec<bool>,
}

pub type Mesh2d<T, Connectivity> = Mesh<T, U2, Connectivity>;

pub type TriangleMesh2d<T> = Mesh2d<T, Tri3d2Connectivity>;
pub type Tri6Mesh2d<T> = Mesh2d<T, Tri6d2Connectivity>;
pub type QuadMesh2d<T> = Mesh2d<T, Quad4d2Connectivity>;
pub type Quad9Mesh2d<T> = Mesh2d<T, Quad9d2Connectivity>;

impl<T, D, C> Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Construct a mesh from vertices and connectivity.
    ///
    /// The connectivity is not checked against the vertices here. Out-of-bounds indices are
    /// reported as errors by the operations that need the vertex data.
    pub fn from_vertices_and_connectivity(vertices: Vec<OPoint<T, D>>, connectivity: Vec<C>) -> Self {
        let neighbors = compute_neighbors(&connectivity);
        let active = vec![true; connectivity.len()];
        Self {
            vertices,
            connectivity,
            neighbors,
            active,
        }
    }

    pub fn vertices(&self) -> &[OPoint<T, D>] {
        &self.vertices
    }

    pub fn connectivity(&self) -> &[C] {
        &self.connectivity
    }

    /// The neighbor across each side of the element.
    ///
    /// # Panics
    ///
    /// Panics if the element index is out of bounds.
    pub fn neighbors(&self, element_index: usize) -> &[Option<usize>] {
        &self.neighbors[element_index]
    }

    pub fn set_active(&mut self, element_index: usize, active: bool) {
        self.active[element_index] = active;
    }

    pub fn num_active_elements(&self) -> usize {
        self.active.iter().filter(|&&active| active).count()
    }

    /// Returns all `(element, side)` pairs without a neighbor, in ascending order.
    pub fn boundary_sides(&self) -> Vec<(usize, usize)> {
        self.neighbors
            .iter()
            .enumerate()
            .flat_map(|(element_index, sides)| {
                sides
                    .iter()
                    .enumerate()
                    .filter(|(_, neighbor)| neighbor.is_none())
                    .map(move |(side, _)| (element_index, side))
            })
            .collect()
    }
}

fn compute_neighbors<C: Connectivity>(connectivity: &[C]) -> Vec<Vec<Option<usize>>> {
    // Use a BTreeMap to avoid non-determinism due to HashMap's internal randomization
    let mut sides_by_nodes: BTreeMap<Vec<usize>, Vec<(usize, usize)>> = BTreeMap::new();
    let mut neighbors: Vec<Vec<Option<usize>>> = connectivity
        .iter()
        .map(|conn| vec![None; conn.num_sides()])
        .collect();

    for (element_index, conn) in connectivity.iter().enumerate() {
        let vertex_indices = conn.vertex_indices();
        for side in 0..conn.num_sides() {
            let mut key: Vec<usize> = conn
                .side_local_nodes(side)
                .unwrap_or(&[])
                .iter()
                .filter_map(|&local| vertex_indices.get(local).copied())
                .collect();
            key.sort_unstable();
            sides_by_nodes
                .entry(key)
                .or_default()
                .push((element_index, side));
        }
    }

    for (nodes, occurrences) in sides_by_nodes {
        match occurrences.as_slice() {
            &[(a, side_a), (b, side_b)] => {
                neighbors[a][side_a] = Some(b);
                neighbors[b][side_b] = Some(a);
            }
            &[_] => {}
            _ => warn!(
                "Side with nodes {:?} is shared by {} elements, treating it as a boundary side.",
                nodes,
                occurrences.len()
            ),
        }
    }

    neighbors
}

impl<T, C> AssemblyMesh<T, U2> for Mesh2d<T, C>
where
    T: Real,
    C: ElementConnectivity<T>,
    C::Element: FiniteElement<T, U2>,
{
    type Element = C::Element;

    fn num_nodes(&self) -> usize {
        self.vertices.len()
    }

    fn num_elements(&self) -> usize {
        self.connectivity.len()
    }

    fn is_active(&self, element_index: usize) -> bool {
        self.active.get(element_index).copied().unwrap_or(false)
    }

    fn reference_cell(&self, element_index: usize) -> Option<ReferenceCell> {
        self.connectivity
            .get(element_index)
            .map(Connectivity::reference_cell)
    }

    fn element_nodes(&self, element_index: usize) -> Option<&[usize]> {
        self.connectivity
            .get(element_index)
            .map(Connectivity::vertex_indices)
    }

    fn node_position(&self, node_index: usize) -> Option<&OPoint<T, U2>> {
        self.vertices.get(node_index)
    }

    fn num_sides(&self, element_index: usize) -> usize {
        self.neighbors
            .get(element_index)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn side_local_nodes(&self, element_index: usize, side: usize) -> Option<&[usize]> {
        self.connectivity.get(element_index)?.side_local_nodes(side)
    }

    fn neighbor(&self, element_index: usize, side: usize) -> Option<usize> {
        *self.neighbors.get(element_index)?.get(side)?
    }

    fn lagrange_nodes(&self, element_index: usize, order: BasisOrder) -> Option<&[usize]> {
        self.connectivity.get(element_index)?.lagrange_nodes(order)
    }

    fn element(&self, element_index: usize, order: BasisOrder) -> Option<Self::Element> {
        self.connectivity
            .get(element_index)?
            .element(order, &self.vertices)
    }
}

impl<T, D, C> Display for Mesh<T, D, C>
where
    T: Scalar,
    D: DimName,
    C: Connectivity,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mesh: {} nodes, {} elements ({} active), {} boundary sides",
            self.vertices.len(),
            self.connectivity.len(),
            self.num_active_elements(),
            self.boundary_sides().len()
        )
    }
}
