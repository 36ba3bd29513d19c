//! Assembly of global CSR systems from local element systems.
use crate::assembly::local::{ElementConnectivityAssembler, ElementSystemAssembler, LocalBlockSystem};
use crate::error::AssemblyError;
use crate::Real;
use eyre::eyre;
use log::debug;
use nalgebra::{DVector, Scalar};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use rayon::prelude::*;
use std::cell::RefCell;
use thread_local::ThreadLocal;

/// A global linear system `A x = b`.
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledSystem<T: Scalar> {
    pub matrix: CsrMatrix<T>,
    pub rhs: DVector<T>,
}

/// An assembler for CSR matrices.
#[derive(Debug)]
pub struct CsrAssembler<T: Scalar> {
    // All members are buffers that help prevent unnecessary allocations
    // when assembling multiple systems with the same assembler
    workspace: RefCell<CsrAssemblerWorkspace<T>>,
}

impl<T: Real> Default for CsrAssembler<T> {
    fn default() -> Self {
        Self {
            workspace: RefCell::new(CsrAssemblerWorkspace::default()),
        }
    }
}

#[derive(Debug, Clone)]
struct CsrAssemblerWorkspace<T: Scalar> {
    element_dofs: Vec<usize>,
    local: LocalBlockSystem<T>,
}

impl<T: Real> Default for CsrAssemblerWorkspace<T> {
    fn default() -> Self {
        Self {
            element_dofs: Vec::new(),
            local: LocalBlockSystem::new(),
        }
    }
}

impl<T: Real> CsrAssemblerWorkspace<T> {
    /// Computes the local system and DOF indices of the given element.
    fn assemble_element<A>(&mut self, element_assembler: &A, element_index: usize) -> eyre::Result<()>
    where
        A: ?Sized + ElementSystemAssembler<T>,
    {
        let dof_count = element_assembler.element_dof_count(element_index);
        self.element_dofs.resize(dof_count, usize::MAX);
        element_assembler.populate_element_dofs(&mut self.element_dofs, element_index);
        element_assembler.assemble_element_system_into(element_index, &mut self.local)?;
        if self.local.size() != dof_count {
            return Err(AssemblyError::DimensionMismatch {
                context: "local system size",
                expected: dof_count,
                actual: self.local.size(),
            }
            .into());
        }
        Ok(())
    }
}

/// Collects all (row, col) pairs coupled by some active element.
fn collect_coordinates(element_assembler: &(impl ?Sized + ElementConnectivityAssembler)) -> Vec<(usize, usize)> {
    let mut coordinates = Vec::new();
    let mut element_dofs = Vec::new();
    for element_index in 0..element_assembler.num_elements() {
        if !element_assembler.is_active(element_index) {
            continue;
        }
        element_dofs.resize(element_assembler.element_dof_count(element_index), usize::MAX);
        element_assembler.populate_element_dofs(&mut element_dofs, element_index);
        for &i in &element_dofs {
            for &j in &element_dofs {
                coordinates.push((i, j));
            }
        }
    }
    coordinates
}

/// Builds a square sparsity pattern from sorted (possibly duplicate) coordinates.
fn pattern_from_sorted_coordinates(num_rows: usize, coordinates: Vec<(usize, usize)>) -> eyre::Result<SparsityPattern> {
    let mut row_offsets = Vec::with_capacity(num_rows + 1);
    let mut column_indices = Vec::new();
    row_offsets.push(0);

    let mut current_row = 0;
    let mut prev_col = None;
    for (i, j) in coordinates {
        if i >= num_rows || j >= num_rows {
            return Err(AssemblyError::DimensionMismatch {
                context: "element DOF index",
                expected: num_rows,
                actual: i.max(j),
            }
            .into());
        }

        while i > current_row {
            row_offsets.push(column_indices.len());
            current_row += 1;
            prev_col = None;
        }

        // Only add column if it is not a duplicate
        if Some(j) != prev_col {
            column_indices.push(j);
            prev_col = Some(j);
        }
    }

    // Fill out offsets for remaining empty rows
    while row_offsets.len() < num_rows + 1 {
        row_offsets.push(column_indices.len());
    }

    Ok(SparsityPattern::try_from_offsets_and_indices(
        num_rows,
        num_rows,
        row_offsets,
        column_indices,
    )?)
}

fn check_dimensions<T: Scalar>(matrix: &CsrMatrix<T>, rhs: &DVector<T>, num_dofs: usize) -> eyre::Result<()> {
    for (context, actual) in [
        ("matrix rows", matrix.nrows()),
        ("matrix columns", matrix.ncols()),
        ("right-hand side", rhs.len()),
    ] {
        if actual != num_dofs {
            return Err(AssemblyError::DimensionMismatch {
                context,
                expected: num_dofs,
                actual,
            }
            .into());
        }
    }
    Ok(())
}

/// Adds a local system into CSR values and a right-hand side sharing the given pattern.
fn add_local_system<T: Real>(
    row_offsets: &[usize],
    col_indices: &[usize],
    values: &mut [T],
    rhs: &mut [T],
    element_dofs: &[usize],
    local: &LocalBlockSystem<T>,
) -> eyre::Result<()> {
    let a = local.matrix();
    let b = local.vector();
    for (i_local, &row) in element_dofs.iter().enumerate() {
        let row_range = row_offsets[row]..row_offsets[row + 1];
        let row_cols = &col_indices[row_range.clone()];
        let row_values = &mut values[row_range];
        for (j_local, &col) in element_dofs.iter().enumerate() {
            let k = row_cols
                .binary_search(&col)
                .map_err(|_| AssemblyError::MissingSparsityEntry { row, col })?;
            row_values[k] += a[(i_local, j_local)];
        }
        rhs[row] += b[i_local];
    }
    Ok(())
}

fn zero_system<T: Real>(pattern: SparsityPattern) -> eyre::Result<AssembledSystem<T>> {
    let num_rows = pattern.major_dim();
    let values = vec![T::zero(); pattern.nnz()];
    Ok(AssembledSystem {
        matrix: CsrMatrix::try_from_pattern_and_values(pattern, values).map_err(|err| eyre!("{}", err))?,
        rhs: DVector::zeros(num_rows),
    })
}

impl<T: Real> CsrAssembler<T> {
    /// Builds the sparsity pattern coupling all DOFs that share an active element.
    pub fn assemble_pattern<A>(&self, element_assembler: &A) -> eyre::Result<SparsityPattern>
    where
        A: ?Sized + ElementConnectivityAssembler,
    {
        let mut coordinates = collect_coordinates(element_assembler);
        coordinates.sort_unstable();
        let pattern = pattern_from_sorted_coordinates(element_assembler.num_dofs(), coordinates)?;
        debug!("Assembled sparsity pattern with {} non-zeros.", pattern.nnz());
        Ok(pattern)
    }

    /// Assembles a new global system.
    pub fn assemble(&self, element_assembler: &dyn ElementSystemAssembler<T>) -> eyre::Result<AssembledSystem<T>> {
        let pattern = self.assemble_pattern(element_assembler)?;
        let mut system = zero_system(pattern)?;
        self.assemble_into(&mut system.matrix, &mut system.rhs, element_assembler)?;
        Ok(system)
    }

    /// Adds the contributions of all active elements to an existing system.
    ///
    /// Assembly is additive: the system must be zeroed beforehand to obtain the system of the
    /// element assembler alone. On error, the system is left partially assembled.
    pub fn assemble_into(
        &self,
        matrix: &mut CsrMatrix<T>,
        rhs: &mut DVector<T>,
        element_assembler: &dyn ElementSystemAssembler<T>,
    ) -> eyre::Result<()> {
        check_dimensions(matrix, rhs, element_assembler.num_dofs())?;
        let ws = &mut *self.workspace.borrow_mut();
        let (row_offsets, col_indices, values) = matrix.csr_data_mut();
        let rhs = rhs.as_mut_slice();

        for element_index in 0..element_assembler.num_elements() {
            if !element_assembler.is_active(element_index) {
                continue;
            }
            ws.assemble_element(element_assembler, element_index)?;
            add_local_system(row_offsets, col_indices, values, rhs, &ws.element_dofs, &ws.local)?;
        }

        Ok(())
    }
}

/// A parallel assembler for CSR matrices.
///
/// The active elements are split into a fixed number of contiguous partitions. Each partition
/// is assembled by a rayon task into its own buffers of CSR values and right-hand side entries,
/// and the partial results are added to the global system in partition order. The result is
/// therefore deterministic for a fixed number of partitions, and agrees with the serial result
/// up to the order of floating-point summation.
#[derive(Debug)]
pub struct CsrParAssembler<T: Scalar + Send> {
    workspace: ThreadLocal<RefCell<CsrAssemblerWorkspace<T>>>,
    num_partitions: Option<usize>,
}

impl<T: Scalar + Send> Default for CsrParAssembler<T> {
    fn default() -> Self {
        Self {
            workspace: Default::default(),
            num_partitions: None,
        }
    }
}

impl<T: Real + Send + Sync> CsrParAssembler<T> {
    /// Uses the given number of partitions instead of the size of the rayon thread pool.
    pub fn with_num_partitions(mut self, num_partitions: Option<usize>) -> Self {
        self.num_partitions = num_partitions;
        self
    }

    pub fn num_partitions(&self) -> usize {
        self.num_partitions
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }

    pub fn assemble_pattern<A>(&self, element_assembler: &A) -> eyre::Result<SparsityPattern>
    where
        A: ?Sized + Sync + ElementConnectivityAssembler,
    {
        let mut coordinates = collect_coordinates(element_assembler);
        coordinates.par_sort_unstable();
        let pattern = pattern_from_sorted_coordinates(element_assembler.num_dofs(), coordinates)?;
        debug!("Assembled sparsity pattern with {} non-zeros.", pattern.nnz());
        Ok(pattern)
    }

    pub fn assemble(
        &self,
        element_assembler: &(dyn Sync + ElementSystemAssembler<T>),
    ) -> eyre::Result<AssembledSystem<T>> {
        let pattern = self.assemble_pattern(element_assembler)?;
        let mut system = zero_system(pattern)?;
        self.assemble_into(&mut system.matrix, &mut system.rhs, element_assembler)?;
        Ok(system)
    }

    /// Adds the contributions of all active elements to an existing system.
    ///
    /// See [`CsrAssembler::assemble_into`].
    pub fn assemble_into(
        &self,
        matrix: &mut CsrMatrix<T>,
        rhs: &mut DVector<T>,
        element_assembler: &(dyn Sync + ElementSystemAssembler<T>),
    ) -> eyre::Result<()> {
        check_dimensions(matrix, rhs, element_assembler.num_dofs())?;

        let active_elements: Vec<usize> = (0..element_assembler.num_elements())
            .filter(|&element_index| element_assembler.is_active(element_index))
            .collect();
        if active_elements.is_empty() {
            return Ok(());
        }

        let num_partitions = self.num_partitions().min(active_elements.len());
        let partition_size = (active_elements.len() + num_partitions - 1) / num_partitions;
        debug!(
            "Assembling {} active elements in {} partitions.",
            active_elements.len(),
            num_partitions
        );

        let (row_offsets, col_indices, values) = matrix.csr_data_mut();
        let nnz = values.len();
        let num_rows = rhs.len();

        let partials = active_elements
            .par_chunks(partition_size)
            .map(|partition| -> eyre::Result<(Vec<T>, Vec<T>)> {
                let ws = &mut *self.workspace.get_or_default().borrow_mut();
                let mut partial_values = vec![T::zero(); nnz];
                let mut partial_rhs = vec![T::zero(); num_rows];
                for &element_index in partition {
                    ws.assemble_element(element_assembler, element_index)?;
                    add_local_system(
                        row_offsets,
                        col_indices,
                        &mut partial_values,
                        &mut partial_rhs,
                        &ws.element_dofs,
                        &ws.local,
                    )?;
                }
                Ok((partial_values, partial_rhs))
            })
            .collect::<eyre::Result<Vec<_>>>()?;

        for (partial_values, partial_rhs) in partials {
            for (v, &dv) in values.iter_mut().zip(&partial_values) {
                *v += dv;
            }
            for (b, &db) in rhs.iter_mut().zip(&partial_rhs) {
                *b += db;
            }
        }

        Ok(())
    }
}
