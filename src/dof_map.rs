//! Mapping from (element, field, local basis function) to global degrees of freedom.
use crate::allocators::DimAllocator;
use crate::error::AssemblyError;
use crate::fields::FieldRegistry;
use crate::mesh::AssemblyMesh;
use log::info;
use nalgebra::{DefaultAllocator, DimName, Scalar};
use std::fmt;
use std::fmt::Display;

/// Global DOF numbering for a set of fields on a mesh.
///
/// A DOF is associated with each (node, field) pair for which the node carries a basis
/// function of the field on some active element. Elements sharing a node share the DOFs at
/// that node. DOFs are numbered node-major: nodes in ascending order, and at each node the
/// fields in declaration order.
///
/// The DOF map is immutable once built. It must be rebuilt whenever the mesh or the fields
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DofMap {
    num_dofs: usize,
    num_fields: usize,
    // Entry `num_fields * element + field` delimits the DOFs of the (element, field) pair
    offsets: Vec<usize>,
    dofs: Vec<usize>,
    local_nodes: Vec<usize>,
    node_dofs: Vec<Option<usize>>,
}

impl DofMap {
    /// Builds the DOF map for the active elements of the mesh.
    ///
    /// Inactive elements have no DOFs.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnsupportedBasisOrder`] if an active element does not support
    /// the basis order of a field, and [`AssemblyError::InvalidElement`] if an element refers to
    /// nodes that are not in the mesh.
    pub fn build<T, D, M>(mesh: &M, fields: &FieldRegistry) -> eyre::Result<Self>
    where
        T: Scalar,
        D: DimName,
        M: ?Sized + AssemblyMesh<T, D>,
        DefaultAllocator: DimAllocator<T, D>,
    {
        let num_fields = fields.len();
        let num_nodes = mesh.num_nodes();
        let num_elements = mesh.num_elements();

        // First pass: mark every (node, field) pair that carries a basis function
        let mut node_dofs = vec![None; num_nodes * num_fields];
        let mut element_field_nodes = Vec::with_capacity(num_elements * num_fields);
        for element_index in 0..num_elements {
            if !mesh.is_active(element_index) {
                element_field_nodes.extend((0..num_fields).map(|_| None));
                continue;
            }
            let element_nodes = mesh
                .element_nodes(element_index)
                .ok_or(AssemblyError::InvalidElement { element_index })?;
            for (field_index, field) in fields.fields().iter().enumerate() {
                let local_nodes =
                    mesh.lagrange_nodes(element_index, field.order())
                        .ok_or_else(|| AssemblyError::UnsupportedBasisOrder {
                            element_index,
                            field: field.name().to_string(),
                            order: field.order(),
                        })?;
                for &local_node in local_nodes {
                    let global_node = *element_nodes
                        .get(local_node)
                        .filter(|&&node| node < num_nodes)
                        .ok_or(AssemblyError::InvalidElement { element_index })?;
                    node_dofs[num_fields * global_node + field_index] = Some(usize::MAX);
                }
                element_field_nodes.push(Some(local_nodes));
            }
        }

        // Second pass: number node-major
        let mut num_dofs = 0;
        for dof in node_dofs.iter_mut().flatten() {
            *dof = num_dofs;
            num_dofs += 1;
        }

        let mut offsets = Vec::with_capacity(num_elements * num_fields + 1);
        let mut dofs = Vec::new();
        let mut local_nodes = Vec::new();
        offsets.push(0);
        for (pair_index, field_nodes) in element_field_nodes.into_iter().enumerate() {
            let element_index = pair_index / num_fields.max(1);
            let field_index = pair_index % num_fields.max(1);
            if let Some(field_nodes) = field_nodes {
                // Validated in the first pass
                let element_nodes = mesh.element_nodes(element_index).unwrap_or(&[]);
                for &local_node in field_nodes {
                    let global_node = element_nodes[local_node];
                    let dof = node_dofs[num_fields * global_node + field_index]
                        .ok_or(AssemblyError::InvalidElement { element_index })?;
                    dofs.push(dof);
                    local_nodes.push(local_node);
                }
            }
            offsets.push(dofs.len());
        }

        let dof_map = Self {
            num_dofs,
            num_fields,
            offsets,
            dofs,
            local_nodes,
            node_dofs,
        };
        info!("Built DOF map. {}", dof_map);
        Ok(dof_map)
    }

    pub fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    pub fn num_fields(&self) -> usize {
        self.num_fields
    }

    pub fn num_elements(&self) -> usize {
        (self.offsets.len() - 1) / self.num_fields.max(1)
    }

    fn range(&self, element_index: usize, field_index: usize) -> std::ops::Range<usize> {
        assert!(field_index < self.num_fields, "Field index out of bounds");
        let pair_index = self.num_fields * element_index + field_index;
        self.offsets[pair_index]..self.offsets[pair_index + 1]
    }

    /// Global DOF indices of the field on the element, in the local basis order of the
    /// element's finite element for the field's basis order.
    ///
    /// # Panics
    ///
    /// Panics if the element or field index is out of bounds.
    pub fn dof_indices_for_field(&self, element_index: usize, field_index: usize) -> &[usize] {
        &self.dofs[self.range(element_index, field_index)]
    }

    /// Element-local node indices carrying the basis functions of the field, in the same order
    /// as [`dof_indices_for_field`](Self::dof_indices_for_field).
    pub fn field_local_nodes(&self, element_index: usize, field_index: usize) -> &[usize] {
        &self.local_nodes[self.range(element_index, field_index)]
    }

    /// Writes the global DOF indices of all fields on the element, concatenated in field
    /// declaration order, into `output`.
    pub fn dof_indices(&self, element_index: usize, output: &mut Vec<usize>) {
        output.clear();
        if self.num_fields > 0 {
            let begin = self.offsets[self.num_fields * element_index];
            let end = self.offsets[self.num_fields * (element_index + 1)];
            output.extend_from_slice(&self.dofs[begin..end]);
        }
    }

    /// The total number of DOFs of the element over all fields.
    pub fn num_element_dofs(&self, element_index: usize) -> usize {
        if self.num_fields == 0 {
            return 0;
        }
        self.offsets[self.num_fields * (element_index + 1)] - self.offsets[self.num_fields * element_index]
    }

    /// The DOF of the field at the given global node, if the node carries one.
    pub fn node_dof(&self, node_index: usize, field_index: usize) -> Option<usize> {
        if field_index >= self.num_fields {
            return None;
        }
        self.node_dofs
            .get(self.num_fields * node_index + field_index)
            .copied()
            .flatten()
    }
}

impl Display for DofMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DOF map: {} DOFs for {} fields on {} elements",
            self.num_dofs,
            self.num_fields,
            self.num_elements()
        )
    }
}
