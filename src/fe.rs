//! Evaluation of finite element bases at quadrature points.
use crate::allocators::DimAllocator;
use crate::element::FiniteElement;
use crate::error::AssemblyError;
use crate::fields::BasisOrder;
use crate::quadrature::{Quadrature, QuadratureRule};
use crate::{Real, SmallDim};
use itertools::izip;
use nalgebra::{try_convert, DefaultAllocator, Dyn, OMatrix, OPoint, OVector};
use std::sync::Arc;

/// Basis values, physical gradients and Jacobian-weighted quadrature weights of a finite
/// element, evaluated at the points of a quadrature rule.
///
/// An evaluator is tied to a basis order and a quadrature rule. Calling
/// [`reinit`](Self::reinit) recomputes all quantities for a new element, reusing the internal
/// buffers.
#[derive(Debug, Clone)]
pub struct FiniteElementEvaluator<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    order: BasisOrder,
    quadrature: Arc<QuadratureRule<T, D>>,
    num_basis: usize,
    // Entries are stored per quadrature point: index `num_basis * q + i`
    phi: Vec<T>,
    dphi: Vec<OVector<T, D>>,
    jxw: Vec<T>,
    points: Vec<OPoint<T, D>>,
    basis_buffer: Vec<T>,
    gradient_buffer: OMatrix<T, D, Dyn>,
}

impl<T, D> FiniteElementEvaluator<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    pub fn new(order: BasisOrder, quadrature: Arc<QuadratureRule<T, D>>) -> Self {
        Self {
            order,
            quadrature,
            num_basis: 0,
            phi: Vec::new(),
            dphi: Vec::new(),
            jxw: Vec::new(),
            points: Vec::new(),
            basis_buffer: Vec::new(),
            gradient_buffer: OMatrix::zeros_generic(D::name(), Dyn(0)),
        }
    }

    pub fn order(&self) -> BasisOrder {
        self.order
    }

    pub fn quadrature(&self) -> &Arc<QuadratureRule<T, D>> {
        &self.quadrature
    }

    /// Replaces the attached quadrature rule. Evaluated data is invalid until the next
    /// [`reinit`](Self::reinit).
    pub fn set_quadrature(&mut self, quadrature: Arc<QuadratureRule<T, D>>) {
        self.quadrature = quadrature;
    }

    /// Evaluates the basis of the given element at all quadrature points.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::DegenerateElement`] if the Jacobian determinant is not positive
    /// (or not finite) at some quadrature point. The evaluator contents are unspecified after
    /// an error.
    pub fn reinit<E>(&mut self, element_index: usize, element: &E) -> eyre::Result<()>
    where
        E: ?Sized + FiniteElement<T, D>,
    {
        let n = element.num_nodes();
        let num_points = self.quadrature.num_points();
        self.num_basis = n;

        self.basis_buffer.resize(n, T::zero());
        if self.gradient_buffer.ncols() != n {
            self.gradient_buffer = OMatrix::zeros_generic(D::name(), Dyn(n));
        }
        self.phi.resize(num_points * n, T::zero());
        self.dphi.resize(num_points * n, OVector::<T, D>::zeros());
        self.jxw.resize(num_points, T::zero());
        self.points.resize(num_points, OPoint::origin());

        let quadrature = &*self.quadrature;
        for (q, (&w, xi)) in izip!(quadrature.weights(), quadrature.points()).enumerate() {
            let j = element.reference_jacobian(xi);
            let det = j.determinant();
            let degenerate = || AssemblyError::DegenerateElement {
                element_index,
                quadrature_point: q,
                determinant: try_convert(det).unwrap_or(f64::NAN),
            };
            // Written as a negation so that NaN is rejected
            if !(det > T::zero()) {
                return Err(degenerate().into());
            }
            let j_inv_t = j.try_inverse().ok_or_else(degenerate)?.transpose();

            element.populate_basis(&mut self.basis_buffer, xi);
            element.populate_basis_gradients(&mut self.gradient_buffer, xi);

            self.jxw[q] = det * w;
            self.points[q] = element.map_reference_coords(xi);
            for i in 0..n {
                self.phi[n * q + i] = self.basis_buffer[i];
                self.dphi[n * q + i] = &j_inv_t * self.gradient_buffer.column(i);
            }
        }

        Ok(())
    }

    /// The number of basis functions of the most recent element.
    pub fn num_basis(&self) -> usize {
        self.num_basis
    }

    pub fn num_quadrature_points(&self) -> usize {
        self.jxw.len()
    }

    /// Value of basis function `i` at quadrature point `q`.
    pub fn phi(&self, q: usize, i: usize) -> T {
        self.phi[self.num_basis * q + i]
    }

    /// Physical gradient of basis function `i` at quadrature point `q`.
    pub fn dphi(&self, q: usize, i: usize) -> &OVector<T, D> {
        &self.dphi[self.num_basis * q + i]
    }

    /// Quadrature weights multiplied by the Jacobian determinant.
    pub fn jxw(&self) -> &[T] {
        &self.jxw
    }

    /// Physical coordinates of the quadrature points.
    pub fn quadrature_points(&self) -> &[OPoint<T, D>] {
        &self.points
    }
}
