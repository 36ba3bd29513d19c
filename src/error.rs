//! Error types for system configuration and assembly.
use crate::fields::BasisOrder;
use crate::quadrature::ReferenceCell;
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Errors that may occur while configuring or assembling a system.
///
/// Fallible public functions return [`eyre::Result`]; the underlying `AssemblyError` can be
/// recovered with [`eyre::Report::downcast_ref`].
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AssemblyError {
    /// A field name could not be resolved against the field registry.
    UnknownField { name: String },
    /// A field with the same name has already been registered.
    DuplicateField { name: String },
    /// An operator refers to the same field in more than one of its roles.
    RepeatedOperatorField { name: String },
    /// The element type of the given element does not support the basis order of the field.
    UnsupportedBasisOrder {
        element_index: usize,
        field: String,
        order: BasisOrder,
    },
    /// The number of basis functions of an element disagrees with the number of DOFs the DOF
    /// map reports for the same (element, field) pair.
    BasisCountMismatch {
        element_index: usize,
        field: String,
        dof_count: usize,
        basis_count: usize,
    },
    /// Two sizes that must agree do not.
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },
    /// An element contribution targets an entry outside the sparsity pattern of the matrix.
    MissingSparsityEntry { row: usize, col: usize },
    /// No quadrature rule is available for the requested cell and degree.
    Quadrature { cell: ReferenceCell, degree: usize },
    /// The element refers to nodes or data the mesh does not provide.
    InvalidElement { element_index: usize },
    /// The Jacobian determinant of the reference map is not positive at a quadrature point.
    DegenerateElement {
        element_index: usize,
        quadrature_point: usize,
        determinant: f64,
    },
}

impl Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { name } => write!(f, "Unknown field \"{}\".", name),
            Self::DuplicateField { name } => write!(f, "Field \"{}\" is already registered.", name),
            Self::RepeatedOperatorField { name } => {
                write!(f, "Field \"{}\" is used more than once by the operator.", name)
            }
            Self::UnsupportedBasisOrder {
                element_index,
                field,
                order,
            } => write!(
                f,
                "Element {} does not support basis order {:?} required by field \"{}\".",
                element_index, order, field
            ),
            Self::BasisCountMismatch {
                element_index,
                field,
                dof_count,
                basis_count,
            } => write!(
                f,
                "Element {} has {} DOFs for field \"{}\", but its basis has {} functions.",
                element_index, dof_count, field, basis_count
            ),
            Self::DimensionMismatch {
                context,
                expected,
                actual,
            } => write!(f, "Dimension mismatch in {}: expected {}, got {}.", context, expected, actual),
            Self::MissingSparsityEntry { row, col } => {
                write!(f, "Entry ({}, {}) is not part of the sparsity pattern.", row, col)
            }
            Self::Quadrature { cell, degree } => {
                write!(f, "No quadrature rule of degree {} available for {:?}.", degree, cell)
            }
            Self::InvalidElement { element_index } => {
                write!(f, "Element {} refers to data not present in the mesh.", element_index)
            }
            Self::DegenerateElement {
                element_index,
                quadrature_point,
                determinant,
            } => write!(
                f,
                "Element {} is degenerate: Jacobian determinant {} at quadrature point {}.",
                element_index, determinant, quadrature_point
            ),
        }
    }
}

impl Error for AssemblyError {}
