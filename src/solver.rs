//! The linear solver interface and a dense reference solver.
use crate::settings::SolverParameters;
use crate::Real;
use eyre::eyre;
use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Scalar};
use nalgebra_sparse::CsrMatrix;

/// Solves an assembled linear system.
pub trait LinearSolver<T: Scalar> {
    fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        parameters: &SolverParameters,
    ) -> eyre::Result<DVector<T>>;
}

/// A direct solver based on the LU decomposition of the densified matrix.
///
/// Only intended for small systems and testing. Direct solution does not iterate, so the
/// solver parameters are only used to check the residual of the solution.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseLuSolver;

impl<T: Real> LinearSolver<T> for DenseLuSolver {
    fn solve(
        &self,
        matrix: &CsrMatrix<T>,
        rhs: &DVector<T>,
        parameters: &SolverParameters,
    ) -> eyre::Result<DVector<T>> {
        if matrix.nrows() != matrix.ncols() || matrix.nrows() != rhs.len() {
            return Err(eyre!(
                "Incompatible system: {}x{} matrix, right-hand side of length {}",
                matrix.nrows(),
                matrix.ncols(),
                rhs.len()
            ));
        }
        let dense = DMatrix::from(matrix);
        let solution = dense
            .clone()
            .lu()
            .solve(rhs)
            .ok_or_else(|| eyre!("Matrix is singular"))?;

        let residual = (&dense * &solution - rhs).norm();
        let relative_residual = if rhs.norm() > T::zero() {
            residual / rhs.norm()
        } else {
            residual
        };
        let relative_residual: f64 = nalgebra::try_convert(relative_residual).unwrap_or(f64::NAN);
        debug!("Dense LU solve: relative residual {:e}", relative_residual);
        if !(relative_residual <= parameters.tolerance) {
            warn!(
                "Relative residual {:e} exceeds tolerance {:e}.",
                relative_residual, parameters.tolerance
            );
        }
        Ok(solution)
    }
}
