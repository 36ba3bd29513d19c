//! Element operators: the weak forms that fill local block systems.
use crate::allocators::DimAllocator;
use crate::assembly::local::LocalBlockSystem;
use crate::error::AssemblyError;
use crate::fe::FiniteElementEvaluator;
use crate::fields::FieldRegistry;
use crate::{Real, SmallDim};
use nalgebra::DefaultAllocator;

/// The evaluated bases of all fields on a single element.
///
/// Fields with the same basis order share an evaluator.
#[derive(Debug, Clone, Copy)]
pub struct ElementBasis<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    element_index: usize,
    evaluators: &'a [FiniteElementEvaluator<T, D>],
    field_evaluators: &'a [usize],
}

impl<'a, T, D> ElementBasis<'a, T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Combines evaluators with a map from field index to evaluator index.
    ///
    /// # Panics
    ///
    /// Panics if an entry of `field_evaluators` is not a valid index into `evaluators`.
    pub fn new(
        element_index: usize,
        evaluators: &'a [FiniteElementEvaluator<T, D>],
        field_evaluators: &'a [usize],
    ) -> Self {
        assert!(
            field_evaluators.iter().all(|&index| index < evaluators.len()),
            "Every field must map to an evaluator"
        );
        Self {
            element_index,
            evaluators,
            field_evaluators,
        }
    }

    pub fn element_index(&self) -> usize {
        self.element_index
    }

    pub fn num_fields(&self) -> usize {
        self.field_evaluators.len()
    }

    /// The evaluator of the given field.
    ///
    /// # Panics
    ///
    /// Panics if the field index is out of bounds.
    pub fn field(&self, field: usize) -> &'a FiniteElementEvaluator<T, D> {
        &self.evaluators[self.field_evaluators[field]]
    }
}

/// Computes the local block system of a single element from its evaluated bases.
///
/// The local system has already been resized to the DOF counts of the element's fields and
/// zeroed when an operator is invoked. Operators only add contributions.
pub trait ElementOperator<T, D>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    /// Checks that the operator is compatible with the fields of a system.
    fn validate(&self, _fields: &FieldRegistry) -> eyre::Result<()> {
        Ok(())
    }

    fn assemble_element(&self, basis: &ElementBasis<T, D>, local: &mut LocalBlockSystem<T>) -> eyre::Result<()>;
}

fn check_field_index(fields: &FieldRegistry, field: usize) -> eyre::Result<()> {
    if field < fields.len() {
        Ok(())
    } else {
        Err(AssemblyError::DimensionMismatch {
            context: "operator field index",
            expected: fields.len(),
            actual: field,
        }
        .into())
    }
}

/// Checks that the given field indices are valid and pairwise distinct.
fn check_distinct_fields(fields: &FieldRegistry, indices: impl IntoIterator<Item = usize>) -> eyre::Result<()> {
    let mut seen = Vec::new();
    for field in indices {
        check_field_index(fields, field)?;
        if seen.contains(&field) {
            let name = fields
                .field(field)
                .map(|registered| registered.name().to_string())
                .unwrap_or_default();
            return Err(AssemblyError::RepeatedOperatorField { name }.into());
        }
        seen.push(field);
    }
    Ok(())
}

/// The Stokes operator for velocity components `u_0, ..., u_{d-1}` and pressure `p`.
///
/// For each velocity component `c` the operator adds
///
/// - `K_{u_c u_c}(i, j) += mu JxW (grad phi_i . grad phi_j)`,
/// - `K_{u_c p}(i, j) += -JxW psi_j d_c phi_i`,
/// - `K_{p u_c}(i, j) += -JxW psi_i d_c phi_j`,
///
/// where `phi` are the velocity basis functions, `psi` the pressure basis functions and `mu`
/// the viscosity. The pressure/pressure block is left empty, giving the usual saddle point
/// structure. No right-hand side is produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StokesOperator<T> {
    velocity: Vec<usize>,
    pressure: usize,
    viscosity: T,
}

impl<T: Real> StokesOperator<T> {
    /// Constructs the operator from field indices, with unit viscosity.
    pub fn new(velocity: Vec<usize>, pressure: usize) -> Self {
        Self {
            velocity,
            pressure,
            viscosity: T::one(),
        }
    }

    /// Constructs the operator by resolving field names.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::UnknownField`] if a name is not registered.
    pub fn from_field_names(fields: &FieldRegistry, velocity: &[&str], pressure: &str) -> eyre::Result<Self> {
        let velocity = velocity
            .iter()
            .map(|name| fields.index_of(name))
            .collect::<eyre::Result<_>>()?;
        Ok(Self::new(velocity, fields.index_of(pressure)?))
    }

    pub fn with_viscosity(self, viscosity: T) -> Self {
        Self { viscosity, ..self }
    }

    pub fn velocity_fields(&self) -> &[usize] {
        &self.velocity
    }

    pub fn pressure_field(&self) -> usize {
        self.pressure
    }

    pub fn viscosity(&self) -> T {
        self.viscosity
    }
}

impl<T, D> ElementOperator<T, D> for StokesOperator<T>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn validate(&self, fields: &FieldRegistry) -> eyre::Result<()> {
        if self.velocity.len() != D::dim() {
            return Err(AssemblyError::DimensionMismatch {
                context: "number of velocity components",
                expected: D::dim(),
                actual: self.velocity.len(),
            }
            .into());
        }
        check_distinct_fields(fields, self.velocity.iter().chain([&self.pressure]).copied())
    }

    fn assemble_element(&self, basis: &ElementBasis<T, D>, local: &mut LocalBlockSystem<T>) -> eyre::Result<()> {
        let p = self.pressure;
        let pressure = basis.field(p);
        let n_p = pressure.num_basis();

        for (c, &u) in self.velocity.iter().enumerate() {
            let velocity = basis.field(u);
            let n_u = velocity.num_basis();

            for (q, &jxw) in velocity.jxw().iter().enumerate() {
                {
                    let mut k_uu = local.block_mut(u, u);
                    for i in 0..n_u {
                        for j in 0..n_u {
                            k_uu[(i, j)] += self.viscosity * jxw * velocity.dphi(q, i).dot(velocity.dphi(q, j));
                        }
                    }
                }
                {
                    let mut k_up = local.block_mut(u, p);
                    for i in 0..n_u {
                        for j in 0..n_p {
                            k_up[(i, j)] += -jxw * pressure.phi(q, j) * velocity.dphi(q, i)[c];
                        }
                    }
                }
                {
                    let mut k_pu = local.block_mut(p, u);
                    for i in 0..n_p {
                        for j in 0..n_u {
                            k_pu[(i, j)] += -jxw * pressure.phi(q, i) * velocity.dphi(q, j)[c];
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

/// The diffusion (Laplace) operator `K_{aa}(i, j) += k JxW (grad phi_i . grad phi_j)` for each
/// of the given fields `a`, with coefficient `k`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffusionOperator<T> {
    fields: Vec<usize>,
    coefficient: T,
}

impl<T: Real> DiffusionOperator<T> {
    pub fn new(fields: Vec<usize>) -> Self {
        Self {
            fields,
            coefficient: T::one(),
        }
    }

    pub fn from_field_names(fields: &FieldRegistry, names: &[&str]) -> eyre::Result<Self> {
        let indices = names
            .iter()
            .map(|name| fields.index_of(name))
            .collect::<eyre::Result<_>>()?;
        Ok(Self::new(indices))
    }

    pub fn with_coefficient(self, coefficient: T) -> Self {
        Self { coefficient, ..self }
    }
}

impl<T, D> ElementOperator<T, D> for DiffusionOperator<T>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    fn validate(&self, fields: &FieldRegistry) -> eyre::Result<()> {
        check_distinct_fields(fields, self.fields.iter().copied())
    }

    fn assemble_element(&self, basis: &ElementBasis<T, D>, local: &mut LocalBlockSystem<T>) -> eyre::Result<()> {
        for &a in &self.fields {
            let evaluator = basis.field(a);
            let n = evaluator.num_basis();
            let mut k_aa = local.block_mut(a, a);
            for (q, &jxw) in evaluator.jxw().iter().enumerate() {
                for i in 0..n {
                    for j in 0..n {
                        k_aa[(i, j)] += self.coefficient * jxw * evaluator.dphi(q, i).dot(evaluator.dphi(q, j));
                    }
                }
            }
        }
        Ok(())
    }
}
