use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use mixfem::assembly::boundary::{lid_driven_cavity_values, PenaltyBoundaryConditions, DEFAULT_PENALTY};
use mixfem::assembly::local::LocalBlockSystem;
use mixfem::assembly::operators::DiffusionOperator;
use mixfem::dof_map::DofMap;
use mixfem::element::Lagrange2dElement;
use mixfem::fields::{BasisOrder, FieldRegistry};
use mixfem::mesh::procedural::create_unit_square_uniform_quad_mesh_2d;
use mixfem::mesh::{AssemblyMesh, QuadMesh2d};
use mixfem::nalgebra::{DMatrix, DVector, Point2, U2};
use mixfem::quadrature::ReferenceCell;
use mixfem::settings::AssemblySettings;
use mixfem::solver::DenseLuSolver;
use mixfem::system::MixedSystem;

/// A single-element mesh in which only the bottom side lies on the domain boundary.
struct OneBoundarySideMesh {
    mesh: QuadMesh2d<f64>,
}

impl AssemblyMesh<f64, U2> for OneBoundarySideMesh {
    type Element = Lagrange2dElement<f64>;

    fn num_nodes(&self) -> usize {
        self.mesh.num_nodes()
    }

    fn num_elements(&self) -> usize {
        self.mesh.num_elements()
    }

    fn is_active(&self, element_index: usize) -> bool {
        self.mesh.is_active(element_index)
    }

    fn reference_cell(&self, element_index: usize) -> Option<ReferenceCell> {
        self.mesh.reference_cell(element_index)
    }

    fn element_nodes(&self, element_index: usize) -> Option<&[usize]> {
        self.mesh.element_nodes(element_index)
    }

    fn node_position(&self, node_index: usize) -> Option<&Point2<f64>> {
        self.mesh.node_position(node_index)
    }

    fn num_sides(&self, element_index: usize) -> usize {
        self.mesh.num_sides(element_index)
    }

    fn side_local_nodes(&self, element_index: usize, side: usize) -> Option<&[usize]> {
        self.mesh.side_local_nodes(element_index, side)
    }

    fn neighbor(&self, _element_index: usize, side: usize) -> Option<usize> {
        // Pretend that an element lies beyond every side except the bottom one
        (side != 0).then_some(1)
    }

    fn lagrange_nodes(&self, element_index: usize, order: BasisOrder) -> Option<&[usize]> {
        self.mesh.lagrange_nodes(element_index, order)
    }

    fn element(&self, element_index: usize, order: BasisOrder) -> Option<Self::Element> {
        self.mesh.element(element_index, order)
    }
}

fn affine(x: &Point2<f64>) -> f64 {
    1.0 + x.x + 2.0 * x.y
}

#[test]
fn penalty_is_added_once_per_boundary_side_occurrence() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(1);
    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::First)
        .unwrap();
    let dof_map = DofMap::build(&mesh, &fields).unwrap();
    let penalty = 1e6;
    let bcs = PenaltyBoundaryConditions::<f64, _>::new(|x: &Point2<f64>, _: usize| affine(x))
        .with_penalty(penalty)
        .constrain_field(0);

    let mut local = LocalBlockSystem::new();
    local.resize(&[4]);
    bcs.apply(0, &mesh, &dof_map, &mut local).unwrap();

    // Every vertex of a lone quad lies on two boundary sides
    let vertices = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let expected_rhs = DVector::from_iterator(
        4,
        vertices
            .iter()
            .map(|&[x, y]| 2.0 * penalty * affine(&Point2::new(x, y))),
    );
    assert_matrix_eq!(local.matrix().clone(), DMatrix::identity(4, 4) * 2.0 * penalty);
    assert_matrix_eq!(local.vector().clone(), expected_rhs, comp = abs, tol = 1e-6);
}

#[test]
fn unconstrained_fields_are_left_untouched() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(1);
    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::First)
        .unwrap()
        .with_field("v", BasisOrder::First)
        .unwrap();
    let dof_map = DofMap::build(&mesh, &fields).unwrap();
    let bcs = PenaltyBoundaryConditions::<f64, _>::new(|_: &Point2<f64>, _: usize| 3.0)
        .constrain(&fields, "v")
        .unwrap();
    assert_eq!(bcs.constrained_fields(), &[1]);
    assert_scalar_eq!(bcs.penalty(), DEFAULT_PENALTY);

    let mut local = LocalBlockSystem::new();
    local.resize(&[4, 4]);
    bcs.apply(0, &mesh, &dof_map, &mut local).unwrap();

    assert_eq!(local.block(0, 0), DMatrix::<f64>::zeros(4, 4));
    assert_eq!(local.block(0, 1), DMatrix::<f64>::zeros(4, 4));
    assert_eq!(local.subvector(0), DVector::<f64>::zeros(4));
    assert_eq!(local.block(1, 1), DMatrix::identity(4, 4) * 2.0 * DEFAULT_PENALTY);
}

#[test]
fn only_nodes_on_boundary_sides_are_penalized() {
    let mesh = OneBoundarySideMesh {
        mesh: create_unit_square_uniform_quad_mesh_2d(1),
    };
    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::First)
        .unwrap();
    let penalty = 1e4;
    let bcs = PenaltyBoundaryConditions::<f64, _>::new(|_: &Point2<f64>, _: usize| 2.0).constrain_field(0);
    let settings = AssemblySettings {
        penalty: Some(penalty),
        ..AssemblySettings::default()
    };

    let constrained = MixedSystem::new(&mesh, fields.clone(), DiffusionOperator::new(vec![0]), bcs, settings)
        .unwrap()
        .assemble()
        .unwrap();
    let unconstrained = MixedSystem::new(
        &mesh,
        fields,
        DiffusionOperator::new(vec![0]),
        crate::unconstrained(),
        AssemblySettings::default(),
    )
    .unwrap()
    .assemble()
    .unwrap();

    // Local nodes 0 and 1 of the bottom side are global nodes 0 and 1 of the unit square
    let mut expected_matrix = DMatrix::from(&unconstrained.matrix);
    let mut expected_rhs = unconstrained.rhs.clone();
    for node in [0, 1] {
        expected_matrix[(node, node)] += penalty;
        expected_rhs[node] += 2.0 * penalty;
    }

    assert_matrix_eq!(DMatrix::from(&constrained.matrix), expected_matrix, comp = abs, tol = 1e-9);
    assert_matrix_eq!(constrained.rhs, expected_rhs, comp = abs, tol = 1e-9);
}

#[test]
fn penalty_solution_converges_to_boundary_values() {
    // An affine function is harmonic and exactly representable, so the discrete solution
    // approaches it everywhere as the penalty grows
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(3);
    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::First)
        .unwrap();

    let mut errors = Vec::new();
    for penalty in [1e2, 1e4, 1e6, 1e8] {
        let bcs = PenaltyBoundaryConditions::<f64, _>::new(|x: &Point2<f64>, _: usize| affine(x))
            .with_penalty(penalty)
            .constrain_field(0);
        let system = MixedSystem::new(
            &mesh,
            fields.clone(),
            DiffusionOperator::new(vec![0]),
            bcs,
            AssemblySettings::default(),
        )
        .unwrap();
        let solution = system
            .solve(&DenseLuSolver, &Default::default())
            .unwrap();

        let error = system
            .nodal_values(&solution, 0)
            .into_iter()
            .zip(mesh.vertices())
            .map(|(value, x)| (value.unwrap() - affine(x)).abs())
            .fold(0.0, f64::max);
        errors.push(error);
    }

    assert!(errors.windows(2).all(|pair| pair[1] < pair[0]), "errors: {:?}", errors);
    assert!(errors[3] < 1e-6, "errors: {:?}", errors);
}

#[test]
fn lid_driven_cavity_values_drive_only_the_lid() {
    let values = lid_driven_cavity_values::<f64>(0, 0.0, 1.0);
    assert_eq!(values(&Point2::new(0.5, 1.0), 0), 1.0);
    assert_eq!(values(&Point2::new(0.5, 1.0), 1), 0.0);
    assert_eq!(values(&Point2::new(0.5, 0.5), 0), 0.0);
    assert_eq!(values(&Point2::new(0.0, 0.98), 0), 0.0);
    assert_eq!(values(&Point2::new(1.0, 0.995), 0), 1.0);

    let scaled = lid_driven_cavity_values::<f64>(2, 0.0, 4.0);
    assert_eq!(scaled(&Point2::new(1.0, 4.0), 2), 1.0);
    assert_eq!(scaled(&Point2::new(1.0, 1.0), 2), 0.0);
}

#[test]
fn lid_driven_cavity_values_respect_offset_domains() {
    // Cavity on [0, 1] x [1, 2]: the bottom wall at y = 1 is not part of the lid
    let values = lid_driven_cavity_values::<f64>(0, 1.0, 2.0);
    assert_eq!(values(&Point2::new(0.5, 1.0), 0), 0.0);
    assert_eq!(values(&Point2::new(0.0, 1.5), 0), 0.0);
    assert_eq!(values(&Point2::new(0.5, 1.995), 0), 1.0);
    assert_eq!(values(&Point2::new(0.5, 2.0), 0), 1.0);
    assert_eq!(values(&Point2::new(0.5, 2.0), 1), 0.0);

    let below_origin = lid_driven_cavity_values::<f64>(0, -3.0, -1.0);
    assert_eq!(below_origin(&Point2::new(0.0, -1.0), 0), 1.0);
    assert_eq!(below_origin(&Point2::new(0.0, -3.0), 0), 0.0);
}
