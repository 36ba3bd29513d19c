//! Local (per-element) block systems and the element-level assembly interface.
use crate::Real;
use nalgebra::{DMatrix, DMatrixView, DVector, DVectorView, Scalar};
use std::ops::{Index, IndexMut, Range};

/// Provides the global DOF indices of each element.
pub trait ElementConnectivityAssembler {
    /// The total number of global DOFs.
    fn num_dofs(&self) -> usize;

    fn num_elements(&self) -> usize;

    /// Whether the element contributes to the global system.
    fn is_active(&self, _element_index: usize) -> bool {
        true
    }

    fn element_dof_count(&self, element_index: usize) -> usize;

    /// Writes the global DOF indices of the element, in the row/column order of its local
    /// system.
    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize);
}

/// Computes the local block system of individual elements.
pub trait ElementSystemAssembler<T: Scalar>: ElementConnectivityAssembler {
    /// Assembles the local system of the given element into `output`.
    ///
    /// The implementation is responsible for resizing `output` with
    /// [`LocalBlockSystem::resize`]. The size of the local system must agree with
    /// [`element_dof_count`](ElementConnectivityAssembler::element_dof_count).
    fn assemble_element_system_into(&self, element_index: usize, output: &mut LocalBlockSystem<T>)
        -> eyre::Result<()>;
}

/// A dense local system partitioned into blocks, one block row and column per field.
///
/// For fields `0 .. F` with local DOF counts `n_0, ..., n_{F-1}`, the matrix has size
/// `N x N` with `N = n_0 + ... + n_{F-1}`, and the block `(a, b)` occupies rows
/// `offset_a .. offset_a + n_a` and columns `offset_b .. offset_b + n_b`, where offsets are
/// cumulative in field order. The vector is partitioned in the same way.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalBlockSystem<T: Scalar> {
    matrix: DMatrix<T>,
    vector: DVector<T>,
    // Cumulative offsets, one more than the number of fields
    offsets: Vec<usize>,
}

impl<T: Real> Default for LocalBlockSystem<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> LocalBlockSystem<T> {
    pub fn new() -> Self {
        Self {
            matrix: DMatrix::zeros(0, 0),
            vector: DVector::zeros(0),
            offsets: vec![0],
        }
    }

    /// Resizes the system to the given per-field DOF counts and zeros all entries.
    ///
    /// Storage is reused if the total size is unchanged.
    pub fn resize(&mut self, field_dof_counts: &[usize]) {
        self.offsets.clear();
        self.offsets.push(0);
        let mut total = 0;
        for count in field_dof_counts {
            total += count;
            self.offsets.push(total);
        }

        if self.matrix.nrows() != total {
            self.matrix.resize_mut(total, total, T::zero());
            self.vector.resize_vertically_mut(total, T::zero());
        }
        self.matrix.fill(T::zero());
        self.vector.fill(T::zero());
    }

    pub fn num_blocks(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn size(&self) -> usize {
        self.vector.len()
    }

    /// The rows (or columns) of the local system belonging to the given field.
    ///
    /// # Panics
    ///
    /// Panics if the field index is out of bounds.
    pub fn block_range(&self, field: usize) -> Range<usize> {
        self.offsets[field]..self.offsets[field + 1]
    }

    pub fn matrix(&self) -> &DMatrix<T> {
        &self.matrix
    }

    pub fn vector(&self) -> &DVector<T> {
        &self.vector
    }

    pub fn block(&self, row_field: usize, col_field: usize) -> DMatrixView<T> {
        let rows = self.block_range(row_field);
        let cols = self.block_range(col_field);
        self.matrix.view((rows.start, cols.start), (rows.len(), cols.len()))
    }

    /// Mutable view of the `(row_field, col_field)` block.
    pub fn block_mut(&mut self, row_field: usize, col_field: usize) -> SubMatrixMut<T> {
        let rows = self.block_range(row_field);
        let cols = self.block_range(col_field);
        SubMatrixMut {
            owner: &mut self.matrix,
            row_offset: rows.start,
            col_offset: cols.start,
            nrows: rows.len(),
            ncols: cols.len(),
        }
    }

    pub fn subvector(&self, field: usize) -> DVectorView<T> {
        let range = self.block_range(field);
        self.vector.rows(range.start, range.len())
    }

    /// Mutable view of the part of the vector belonging to the given field.
    pub fn subvector_mut(&mut self, field: usize) -> SubVectorMut<T> {
        let range = self.block_range(field);
        SubVectorMut {
            owner: &mut self.vector,
            offset: range.start,
            len: range.len(),
        }
    }
}

/// A rectangular block of a dense matrix, described by offsets and extents into its owner.
///
/// Indexing is relative to the block and writes through to the owner. Indices outside the
/// block panic, even if they would be valid in the owner.
#[derive(Debug)]
pub struct SubMatrixMut<'a, T: Scalar> {
    owner: &'a mut DMatrix<T>,
    row_offset: usize,
    col_offset: usize,
    nrows: usize,
    ncols: usize,
}

impl<'a, T: Scalar> SubMatrixMut<'a, T> {
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    pub fn ncols(&self) -> usize {
        self.ncols
    }

    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn col_offset(&self) -> usize {
        self.col_offset
    }

    fn owner_index(&self, (i, j): (usize, usize)) -> (usize, usize) {
        assert!(
            i < self.nrows && j < self.ncols,
            "Index ({}, {}) out of bounds for block of size {}x{}",
            i,
            j,
            self.nrows,
            self.ncols
        );
        (self.row_offset + i, self.col_offset + j)
    }
}

impl<'a, T: Scalar> Index<(usize, usize)> for SubMatrixMut<'a, T> {
    type Output = T;

    fn index(&self, index: (usize, usize)) -> &T {
        &self.owner[self.owner_index(index)]
    }
}

impl<'a, T: Scalar> IndexMut<(usize, usize)> for SubMatrixMut<'a, T> {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut T {
        let index = self.owner_index(index);
        &mut self.owner[index]
    }
}

/// A contiguous segment of a dense vector, described by offset and length into its owner.
#[derive(Debug)]
pub struct SubVectorMut<'a, T: Scalar> {
    owner: &'a mut DVector<T>,
    offset: usize,
    len: usize,
}

impl<'a, T: Scalar> SubVectorMut<'a, T> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a, T: Scalar> Index<usize> for SubVectorMut<'a, T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        assert!(i < self.len, "Index {} out of bounds for segment of length {}", i, self.len);
        &self.owner[self.offset + i]
    }
}

impl<'a, T: Scalar> IndexMut<usize> for SubVectorMut<'a, T> {
    fn index_mut(&mut self, i: usize) -> &mut T {
        assert!(i < self.len, "Index {} out of bounds for segment of length {}", i, self.len);
        &mut self.owner[self.offset + i]
    }
}
