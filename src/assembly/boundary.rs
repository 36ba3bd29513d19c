//! Penalty enforcement of Dirichlet boundary conditions on local systems.
use crate::allocators::DimAllocator;
use crate::assembly::local::LocalBlockSystem;
use crate::dof_map::DofMap;
use crate::error::AssemblyError;
use crate::fields::FieldRegistry;
use crate::mesh::AssemblyMesh;
use crate::Real;
use nalgebra::{convert, DefaultAllocator, DimName, OPoint, Point2};
use numeric_literals::replace_float_literals;

/// The default penalty parameter.
pub const DEFAULT_PENALTY: f64 = 1e10;

/// Dirichlet boundary conditions enforced with the penalty method.
///
/// For every side of an element without a neighbor, every node on that side and every
/// constrained field with a basis function at that node, the penalty is added to the diagonal
/// entry of the field's self-block and `penalty * value(x, field)` to the field's sub-vector,
/// where `x` is the position of the node. A node shared by several boundary sides or elements
/// receives one contribution per occurrence.
///
/// The sparsity structure of the system is never changed. The price is a poorly conditioned
/// matrix for large penalties, and the boundary values are only satisfied approximately, with
/// an error that decreases as the penalty grows.
#[derive(Debug, Clone)]
pub struct PenaltyBoundaryConditions<T, F> {
    penalty: T,
    constrained_fields: Vec<usize>,
    values: F,
}

impl<T, F> PenaltyBoundaryConditions<T, F>
where
    T: Real,
{
    /// Creates boundary conditions with the given value function and the default penalty.
    ///
    /// The value function receives the node position and the field index. No field is
    /// constrained until [`constrain_field`](Self::constrain_field) is called.
    pub fn new(values: F) -> Self {
        Self {
            penalty: convert(DEFAULT_PENALTY),
            constrained_fields: Vec::new(),
            values,
        }
    }

    pub fn with_penalty(self, penalty: T) -> Self {
        Self { penalty, ..self }
    }

    pub fn set_penalty(&mut self, penalty: T) {
        self.penalty = penalty;
    }

    /// Constrains the field with the given index on the whole boundary.
    pub fn constrain_field(mut self, field: usize) -> Self {
        if !self.constrained_fields.contains(&field) {
            self.constrained_fields.push(field);
        }
        self
    }

    /// Constrains the field with the given name on the whole boundary.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnknownField`] if the name is not registered.
    pub fn constrain(self, fields: &FieldRegistry, name: &str) -> eyre::Result<Self> {
        Ok(self.constrain_field(fields.index_of(name)?))
    }

    pub fn penalty(&self) -> T {
        self.penalty
    }

    pub fn constrained_fields(&self) -> &[usize] {
        &self.constrained_fields
    }

    /// Adds the penalty contributions of the given element to its local system.
    ///
    /// Elements without boundary sides are left untouched.
    pub fn apply<D, M>(
        &self,
        element_index: usize,
        mesh: &M,
        dof_map: &DofMap,
        local: &mut LocalBlockSystem<T>,
    ) -> eyre::Result<()>
    where
        D: DimName,
        M: ?Sized + AssemblyMesh<T, D>,
        F: Fn(&OPoint<T, D>, usize) -> T,
        DefaultAllocator: DimAllocator<T, D>,
    {
        if self.constrained_fields.is_empty() {
            return Ok(());
        }

        let invalid = || AssemblyError::InvalidElement { element_index };
        let element_nodes = mesh.element_nodes(element_index).ok_or_else(invalid)?;

        for side in 0..mesh.num_sides(element_index) {
            if mesh.neighbor(element_index, side).is_some() {
                continue;
            }

            let side_nodes = mesh
                .side_local_nodes(element_index, side)
                .ok_or_else(invalid)?;
            for &local_node in side_nodes {
                let global_node = *element_nodes.get(local_node).ok_or_else(invalid)?;
                let x = mesh.node_position(global_node).ok_or_else(invalid)?;

                for &field in &self.constrained_fields {
                    let basis_index = dof_map
                        .field_local_nodes(element_index, field)
                        .iter()
                        .position(|&node| node == local_node);
                    if let Some(i) = basis_index {
                        let value = (self.values)(x, field);
                        local.block_mut(field, field)[(i, i)] += self.penalty;
                        local.subvector_mut(field)[i] += self.penalty * value;
                    }
                }
            }
        }

        Ok(())
    }
}

/// Boundary values of the lid-driven cavity on a domain spanning `y_min <= y <= y_max`.
///
/// The horizontal velocity (field `u`) is one on the lid, the top percent of the height
/// (`y > y_min + 0.99 * (y_max - y_min)`), and zero elsewhere. All other fields, including the
/// vertical velocity, are zero.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn lid_driven_cavity_values<T: Real>(u: usize, y_min: T, y_max: T) -> impl Fn(&Point2<T>, usize) -> T {
    let lid = y_min + 0.99 * (y_max - y_min);
    move |x: &Point2<T>, field: usize| {
        if field == u && x.y > lid {
            1.0
        } else {
            0.0
        }
    }
}
