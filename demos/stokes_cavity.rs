//! Stokes flow in a lid-driven cavity.
//!
//! Assembles the Taylor-Hood (Q2/Q1) discretization of the Stokes equations on a structured
//! mesh of the unit square, drives the flow with a unit horizontal velocity on the lid and
//! solves the resulting saddle point system with a dense direct solver.
//!
//! Usage: `cargo run --release --example stokes_cavity [cells_per_dim] [--parallel]`
use eyre::eyre;
use mixfem::assembly::boundary::{lid_driven_cavity_values, PenaltyBoundaryConditions};
use mixfem::assembly::operators::StokesOperator;
use mixfem::fields::{BasisOrder, FieldRegistry};
use mixfem::mesh::procedural::create_unit_square_uniform_quad9_mesh_2d;
use mixfem::nalgebra_sparse::SparseEntryMut;
use mixfem::settings::{AssemblySettings, SolverParameters};
use mixfem::solver::{DenseLuSolver, LinearSolver};
use mixfem::system::{AssembledSystem, MixedSystem};
use std::time::Instant;

fn main() -> eyre::Result<()> {
    let mut cells_per_dim = 15;
    let mut parallel = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--parallel" => parallel = true,
            _ => cells_per_dim = arg.parse()?,
        }
    }

    let mesh = create_unit_square_uniform_quad9_mesh_2d::<f64>(cells_per_dim);
    println!("{}", mesh);

    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::Second)?
        .with_field("v", BasisOrder::Second)?
        .with_field("p", BasisOrder::First)?;
    let operator = StokesOperator::from_field_names(&fields, &["u", "v"], "p")?;
    let bcs = PenaltyBoundaryConditions::new(lid_driven_cavity_values::<f64>(fields.index_of("u")?, 0.0, 1.0))
        .constrain(&fields, "u")?
        .constrain(&fields, "v")?;
    let settings = AssemblySettings {
        parallel,
        ..AssemblySettings::default()
    };
    let system = MixedSystem::new(&mesh, fields, operator, bcs, settings)?;
    println!("{}", system);

    let timer = Instant::now();
    let AssembledSystem { mut matrix, rhs } = system.assemble()?;
    println!(
        "Assembled {}x{} matrix with {} non-zeros in {:.3} s.",
        matrix.nrows(),
        matrix.ncols(),
        matrix.nnz(),
        timer.elapsed().as_secs_f64()
    );

    // Pressure is only determined up to a constant, fix its level at the lower-left corner
    let p = system.fields().index_of("p")?;
    let pinned = system
        .dof_map()
        .node_dof(0, p)
        .ok_or_else(|| eyre!("No pressure DOF at node 0"))?;
    match matrix.get_entry_mut(pinned, pinned) {
        Some(SparseEntryMut::NonZero(value)) => *value += 1.0,
        _ => return Err(eyre!("Diagonal entry of DOF {} is not stored", pinned)),
    }

    let timer = Instant::now();
    let solution = DenseLuSolver.solve(&matrix, &rhs, &SolverParameters::default())?;
    println!("Solved in {:.3} s.", timer.elapsed().as_secs_f64());

    let fields = system.fields();
    for (index, field) in fields.fields().iter().enumerate() {
        let values: Vec<f64> = system
            .nodal_values(&solution, index)
            .into_iter()
            .flatten()
            .collect();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        println!("{}: {} values in [{:.6}, {:.6}]", field.name(), values.len(), min, max);
    }

    // Horizontal velocity along the vertical centerline
    let u = system.nodal_values(&solution, fields.index_of("u")?);
    let lattice = 2 * cells_per_dim + 1;
    println!("Horizontal velocity along x = 0.5:");
    for (node, position) in mesh.vertices().iter().enumerate() {
        let (i, j) = (node % lattice, node / lattice);
        if 2 * i + 1 == lattice && j % 2 == 0 {
            if let Some(value) = u[node] {
                println!("  y = {:.4}: u = {:+.6}", position.y, value);
            }
        }
    }

    Ok(())
}
