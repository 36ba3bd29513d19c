//! Element assembly for coupled multi-field finite element systems.
//!
//! The crate assembles the global sparse linear system of a mixed finite element problem,
//! such as the velocity/pressure formulation of Stokes flow, on an unstructured mesh. Each
//! element contributes a dense local block system, one block per pair of fields, which is
//! scattered additively into a CSR matrix and a dense right-hand side. Boundary conditions are
//! enforced with a penalty method, so that the sparsity structure of the discretization is
//! never modified.
//!
//! The assembly pipeline consists of
//!
//! - [quadrature rules](crate::quadrature) on reference cells,
//! - [finite element evaluators](crate::fe) computing basis values, physical gradients and
//!   Jacobian-weighted quadrature weights per element,
//! - the [DOF map](crate::dof_map) from (element, field, local basis function) to global index,
//! - [element operators](crate::assembly::operators) producing local block systems,
//! - [penalty boundary conditions](crate::assembly::boundary),
//! - the [serial and parallel global assemblers](crate::assembly::global).
//!
//! [`MixedSystem`](crate::system::MixedSystem) ties all of these together.
use nalgebra::{DimMin, DimName, RealField};

pub mod allocators;
pub mod assembly;
pub mod connectivity;
pub mod dof_map;
pub mod element;
pub mod error;
pub mod fe;
pub mod fields;
pub mod mesh;
pub mod quadrature;
pub mod settings;
pub mod solver;
pub mod system;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// A real scalar type usable in assembly.
///
/// Trait alias for the numeric requirements of generic `mixfem` routines.
pub trait Real: RealField + Copy {}

impl<T> Real for T where T: RealField + Copy {}

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic `mixfem` routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
