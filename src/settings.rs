//! Serializable configuration of assembly and solution.
use serde::{Deserialize, Serialize};

/// Settings for assembling a [`MixedSystem`](crate::system::MixedSystem).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblySettings {
    /// Overrides the penalty of the boundary conditions if set.
    pub penalty: Option<f64>,
    /// Polynomial degree integrated exactly by the quadrature rule. Defaults to
    /// `2 * max_order + 1`, where `max_order` is the highest basis order of the fields.
    pub quadrature_degree: Option<usize>,
    /// Whether to assemble in parallel.
    pub parallel: bool,
    /// Number of element partitions for parallel assembly. Defaults to the size of the rayon
    /// thread pool.
    pub num_partitions: Option<usize>,
}

impl Default for AssemblySettings {
    fn default() -> Self {
        Self {
            penalty: None,
            quadrature_degree: None,
            parallel: false,
            num_partitions: None,
        }
    }
}

impl AssemblySettings {
    /// The quadrature degree to use for fields of the given maximum basis degree.
    pub fn quadrature_degree_for(&self, max_basis_degree: usize) -> usize {
        self.quadrature_degree.unwrap_or(2 * max_basis_degree + 1)
    }
}

/// Parameters handed to the linear solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParameters {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SolverParameters {
    fn default() -> Self {
        Self {
            max_iterations: 250,
            tolerance: 1e-12,
        }
    }
}
