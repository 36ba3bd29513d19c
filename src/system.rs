//! Configured multi-field systems ready for assembly.
use crate::allocators::DimAllocator;
use crate::assembly::boundary::PenaltyBoundaryConditions;
use crate::assembly::global::{CsrAssembler, CsrParAssembler};
use crate::assembly::local::{ElementConnectivityAssembler, ElementSystemAssembler, LocalBlockSystem};
use crate::assembly::operators::{ElementBasis, ElementOperator};
use crate::dof_map::DofMap;
use crate::error::AssemblyError;
use crate::fe::FiniteElementEvaluator;
use crate::fields::{BasisOrder, FieldRegistry};
use crate::mesh::AssemblyMesh;
use crate::quadrature::QuadratureTable;
use crate::settings::{AssemblySettings, SolverParameters};
use crate::solver::LinearSolver;
use crate::{Real, SmallDim};
use log::{info, warn};
use nalgebra::{convert, DVector, DefaultAllocator, OPoint};
use nalgebra_sparse::CsrMatrix;
use std::cell::RefCell;
use std::fmt;
use std::fmt::Display;
use std::sync::Arc;
use thread_local::ThreadLocal;

pub use crate::assembly::global::AssembledSystem;

/// A multi-field finite element system on a mesh: fields, DOF map, quadrature, element
/// operator and boundary conditions.
///
/// The system computes local block systems element by element and hands them to the serial or
/// parallel global assembler. Evaluators are kept in per-thread workspaces, so that a single
/// system can be assembled from several threads at once.
pub struct MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    DefaultAllocator: DimAllocator<T, D>,
{
    mesh: &'a M,
    fields: FieldRegistry,
    dof_map: DofMap,
    quadrature: QuadratureTable<T, D>,
    quadrature_degree: usize,
    operator: Op,
    boundary_conditions: PenaltyBoundaryConditions<T, F>,
    settings: AssemblySettings,
    // Distinct basis orders, one evaluator each, and the evaluator of each field
    orders: Vec<BasisOrder>,
    field_evaluators: Vec<usize>,
    workspace: ThreadLocal<RefCell<SystemWorkspace<T, D>>>,
}

struct SystemWorkspace<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    evaluators: Vec<FiniteElementEvaluator<T, D>>,
    field_dof_counts: Vec<usize>,
}

impl<T, D> Default for SystemWorkspace<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn default() -> Self {
        Self {
            evaluators: Vec::new(),
            field_dof_counts: Vec::new(),
        }
    }
}

impl<'a, T, D, M, Op, F> MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    Op: ElementOperator<T, D>,
    F: Fn(&OPoint<T, D>, usize) -> T,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Configures a system.
    ///
    /// Builds the DOF map and the quadrature rules for the reference cells of the active
    /// elements. If the settings carry a penalty, it replaces the penalty of the boundary
    /// conditions.
    ///
    /// # Errors
    ///
    /// Fails if the operator or the boundary conditions refer to fields that are not
    /// registered, if an element does not support the basis order of a field, or if no
    /// quadrature rule of the required degree is available.
    pub fn new(
        mesh: &'a M,
        fields: FieldRegistry,
        operator: Op,
        mut boundary_conditions: PenaltyBoundaryConditions<T, F>,
        settings: AssemblySettings,
    ) -> eyre::Result<Self> {
        operator.validate(&fields)?;
        for &field in boundary_conditions.constrained_fields() {
            if field >= fields.len() {
                return Err(AssemblyError::DimensionMismatch {
                    context: "constrained field index",
                    expected: fields.len(),
                    actual: field,
                }
                .into());
            }
        }

        if let Some(penalty) = settings.penalty {
            boundary_conditions.set_penalty(convert(penalty));
        }
        if boundary_conditions.constrained_fields().is_empty() {
            warn!("No fields are constrained on the boundary.");
        } else if boundary_conditions.penalty() <= T::one() {
            warn!("Boundary penalty {} is not larger than one.", boundary_conditions.penalty());
        }

        let dof_map = DofMap::build(mesh, &fields)?;

        let mut orders = Vec::new();
        let mut field_evaluators = Vec::with_capacity(fields.len());
        for field in fields.fields() {
            let evaluator_index = match orders.iter().position(|&order| order == field.order()) {
                Some(index) => index,
                None => {
                    orders.push(field.order());
                    orders.len() - 1
                }
            };
            field_evaluators.push(evaluator_index);
        }

        let max_degree = fields
            .max_order()
            .map(|order| order.degree())
            .unwrap_or(1);
        let quadrature_degree = settings.quadrature_degree_for(max_degree);
        let cells = mesh
            .active_elements()
            .into_iter()
            .filter_map(|element_index| mesh.reference_cell(element_index));
        let quadrature = QuadratureTable::gauss(cells, quadrature_degree)?;

        let system = Self {
            mesh,
            fields,
            dof_map,
            quadrature,
            quadrature_degree,
            operator,
            boundary_conditions,
            settings,
            orders,
            field_evaluators,
            workspace: ThreadLocal::new(),
        };
        info!("Configured system. {}", system);
        Ok(system)
    }

    pub fn mesh(&self) -> &'a M {
        self.mesh
    }

    pub fn fields(&self) -> &FieldRegistry {
        &self.fields
    }

    pub fn dof_map(&self) -> &DofMap {
        &self.dof_map
    }

    pub fn quadrature(&self) -> &QuadratureTable<T, D> {
        &self.quadrature
    }

    pub fn operator(&self) -> &Op {
        &self.operator
    }

    pub fn boundary_conditions(&self) -> &PenaltyBoundaryConditions<T, F> {
        &self.boundary_conditions
    }

    pub fn settings(&self) -> &AssemblySettings {
        &self.settings
    }

    /// The values of the given field at the mesh nodes, extracted from a solution vector.
    ///
    /// Nodes that carry no DOF of the field get `None`.
    pub fn nodal_values(&self, solution: &DVector<T>, field: usize) -> Vec<Option<T>> {
        (0..self.mesh.num_nodes())
            .map(|node| {
                self.dof_map
                    .node_dof(node, field)
                    .and_then(|dof| solution.get(dof).copied())
            })
            .collect()
    }
}

impl<'a, T, D, M, Op, F> MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    Op: ElementOperator<T, D>,
    F: Fn(&OPoint<T, D>, usize) -> T,
    FiniteElementEvaluator<T, D>: Send,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Assembles the global system, in parallel if configured in the settings.
    pub fn assemble(&self) -> eyre::Result<AssembledSystem<T>>
    where
        Self: Sync,
    {
        info!(
            "Assembling {} DOFs on {} elements ({}).",
            self.dof_map.num_dofs(),
            self.mesh.num_elements(),
            if self.settings.parallel { "parallel" } else { "serial" }
        );
        if self.settings.parallel {
            CsrParAssembler::default()
                .with_num_partitions(self.settings.num_partitions)
                .assemble(self)
        } else {
            CsrAssembler::default().assemble(self)
        }
    }

    /// Adds the system to existing global storage, which must have the sparsity pattern of
    /// the system (or a superset of it).
    pub fn assemble_into(&self, matrix: &mut CsrMatrix<T>, rhs: &mut DVector<T>) -> eyre::Result<()>
    where
        Self: Sync,
    {
        if self.settings.parallel {
            CsrParAssembler::default()
                .with_num_partitions(self.settings.num_partitions)
                .assemble_into(matrix, rhs, self)
        } else {
            CsrAssembler::default().assemble_into(matrix, rhs, self)
        }
    }

    /// Assembles the global system and solves it with the given solver.
    pub fn solve(&self, solver: &dyn LinearSolver<T>, parameters: &SolverParameters) -> eyre::Result<DVector<T>>
    where
        Self: Sync,
    {
        let AssembledSystem { matrix, rhs } = self.assemble()?;
        solver.solve(&matrix, &rhs, parameters)
    }
}

impl<'a, T, D, M, Op, F> ElementConnectivityAssembler for MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn num_dofs(&self) -> usize {
        self.dof_map.num_dofs()
    }

    fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    fn is_active(&self, element_index: usize) -> bool {
        self.mesh.is_active(element_index)
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.dof_map.num_element_dofs(element_index)
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        let mut offset = 0;
        for field in 0..self.fields.len() {
            let dofs = self.dof_map.dof_indices_for_field(element_index, field);
            output[offset..offset + dofs.len()].copy_from_slice(dofs);
            offset += dofs.len();
        }
    }
}

impl<'a, T, D, M, Op, F> ElementSystemAssembler<T> for MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    Op: ElementOperator<T, D>,
    F: Fn(&OPoint<T, D>, usize) -> T,
    FiniteElementEvaluator<T, D>: Send,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn assemble_element_system_into(&self, element_index: usize, output: &mut LocalBlockSystem<T>) -> eyre::Result<()> {
        let ws = &mut *self.workspace.get_or_default().borrow_mut();

        let cell = self
            .mesh
            .reference_cell(element_index)
            .ok_or(AssemblyError::InvalidElement { element_index })?;
        let rule = self
            .quadrature
            .rule_for(cell)
            .ok_or(AssemblyError::Quadrature {
                cell,
                degree: self.quadrature_degree,
            })?;

        if ws.evaluators.len() != self.orders.len() {
            ws.evaluators = self
                .orders
                .iter()
                .map(|&order| FiniteElementEvaluator::new(order, Arc::clone(rule)))
                .collect();
        }

        for (evaluator, &order) in ws.evaluators.iter_mut().zip(&self.orders) {
            if !Arc::ptr_eq(evaluator.quadrature(), rule) {
                evaluator.set_quadrature(Arc::clone(rule));
            }
            let element = self
                .mesh
                .element(element_index, order)
                .ok_or_else(|| self.unsupported_order(element_index, order))?;
            evaluator.reinit(element_index, &element)?;
        }

        ws.field_dof_counts.clear();
        for (field_index, field) in self.fields.fields().iter().enumerate() {
            let dof_count = self
                .dof_map
                .dof_indices_for_field(element_index, field_index)
                .len();
            let basis_count = ws.evaluators[self.field_evaluators[field_index]].num_basis();
            if dof_count != basis_count {
                return Err(AssemblyError::BasisCountMismatch {
                    element_index,
                    field: field.name().to_string(),
                    dof_count,
                    basis_count,
                }
                .into());
            }
            ws.field_dof_counts.push(dof_count);
        }

        output.resize(&ws.field_dof_counts);
        let basis = ElementBasis::new(element_index, &ws.evaluators, &self.field_evaluators);
        self.operator.assemble_element(&basis, output)?;
        self.boundary_conditions
            .apply(element_index, self.mesh, &self.dof_map, output)
    }
}

impl<'a, T, D, M, Op, F> MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn unsupported_order(&self, element_index: usize, order: BasisOrder) -> AssemblyError {
        let field = self
            .fields
            .fields()
            .iter()
            .find(|field| field.order() == order)
            .map(|field| field.name().to_string())
            .unwrap_or_default();
        AssemblyError::UnsupportedBasisOrder {
            element_index,
            field,
            order,
        }
    }
}

impl<'a, T, D, M, Op, F> Display for MixedSystem<'a, T, D, M, Op, F>
where
    T: Real,
    D: SmallDim,
    M: ?Sized + AssemblyMesh<T, D>,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}; {}; quadrature degree {}",
            self.fields, self.dof_map, self.quadrature_degree
        )
    }
}
