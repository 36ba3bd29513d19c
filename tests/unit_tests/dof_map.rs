use mixfem::dof_map::DofMap;
use mixfem::error::AssemblyError;
use mixfem::fields::{BasisOrder, FieldRegistry};
use mixfem::mesh::procedural::{
    create_rectangular_mesh_2d, create_unit_square_uniform_quad9_mesh_2d, create_unit_square_uniform_quad_mesh_2d,
};
use mixfem::mesh::QuadMesh2d;
use mixfem::nalgebra::Point2;

fn taylor_hood_fields() -> FieldRegistry {
    FieldRegistry::new()
        .with_field("u", BasisOrder::Second)
        .unwrap()
        .with_field("v", BasisOrder::Second)
        .unwrap()
        .with_field("p", BasisOrder::First)
        .unwrap()
}

#[test]
fn single_quad9_dofs_are_numbered_node_major() {
    let mesh = create_unit_square_uniform_quad9_mesh_2d::<f64>(1);
    let dof_map = DofMap::build(&mesh, &taylor_hood_fields()).unwrap();

    // 9 nodes carry (u, v), the 4 corners additionally carry p
    assert_eq!(dof_map.num_dofs(), 22);
    assert_eq!(dof_map.num_fields(), 3);
    assert_eq!(dof_map.num_elements(), 1);
    assert_eq!(dof_map.num_element_dofs(0), 22);

    // Lattice nodes are numbered row by row; corners are 0, 2, 6 and 8
    let expected_node_dofs = [
        (Some(0), Some(1), Some(2)),
        (Some(3), Some(4), None),
        (Some(5), Some(6), Some(7)),
        (Some(8), Some(9), None),
        (Some(10), Some(11), None),
        (Some(12), Some(13), None),
        (Some(14), Some(15), Some(16)),
        (Some(17), Some(18), None),
        (Some(19), Some(20), Some(21)),
    ];
    for (node, &(u, v, p)) in expected_node_dofs.iter().enumerate() {
        assert_eq!(dof_map.node_dof(node, 0), u, "node {node}");
        assert_eq!(dof_map.node_dof(node, 1), v, "node {node}");
        assert_eq!(dof_map.node_dof(node, 2), p, "node {node}");
    }
    assert_eq!(dof_map.node_dof(0, 3), None);
    assert_eq!(dof_map.node_dof(9, 0), None);

    // Local order follows the Quad9 connectivity [0, 2, 8, 6, 1, 5, 7, 3, 4]
    assert_eq!(dof_map.dof_indices_for_field(0, 0), &[0, 5, 19, 14, 3, 12, 17, 8, 10]);
    assert_eq!(dof_map.dof_indices_for_field(0, 1), &[1, 6, 20, 15, 4, 13, 18, 9, 11]);
    assert_eq!(dof_map.dof_indices_for_field(0, 2), &[2, 7, 21, 16]);
    assert_eq!(dof_map.field_local_nodes(0, 2), &[0, 1, 2, 3]);
    assert_eq!(dof_map.field_local_nodes(0, 0), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);

    let mut dofs = Vec::new();
    dof_map.dof_indices(0, &mut dofs);
    assert_eq!(dofs.len(), 22);
    assert_eq!(&dofs[..9], dof_map.dof_indices_for_field(0, 0));
    assert_eq!(&dofs[18..], dof_map.dof_indices_for_field(0, 2));
}

#[test]
fn elements_sharing_nodes_share_dofs() {
    let mesh = create_unit_square_uniform_quad9_mesh_2d::<f64>(3);
    let fields = taylor_hood_fields();
    let dof_map = DofMap::build(&mesh, &fields).unwrap();

    // (7 x 7) lattice nodes carry velocities, (4 x 4) vertices carry pressure
    assert_eq!(dof_map.num_dofs(), 2 * 49 + 16);

    let mut counts = vec![0; dof_map.num_dofs()];
    for element_index in 0..mesh.connectivity().len() {
        for field in 0..fields.len() {
            let dofs = dof_map.dof_indices_for_field(element_index, field);
            let local_nodes = dof_map.field_local_nodes(element_index, field);
            assert_eq!(dofs.len(), local_nodes.len());
            for (&dof, &local_node) in dofs.iter().zip(local_nodes) {
                let node = mesh.connectivity()[element_index].0[local_node];
                assert_eq!(dof_map.node_dof(node, field), Some(dof));
                counts[dof] += 1;
            }
        }
    }
    // Every DOF belongs to some element, and the element center nodes belong to one only
    assert!(counts.iter().all(|&count| count >= 1));
    assert_eq!(counts.iter().filter(|&&count| count == 4).count(), 2 * 4 + 4);
}

#[test]
fn inactive_elements_have_no_dofs() {
    let mut mesh: QuadMesh2d<f64> = create_rectangular_mesh_2d(2, 1, &Point2::new(0.0, 0.0), &Point2::new(2.0, 1.0));
    mesh.set_active(1, false);
    let fields = FieldRegistry::new()
        .with_field("u", BasisOrder::First)
        .unwrap();
    let dof_map = DofMap::build(&mesh, &fields).unwrap();

    // Nodes 2 and 5 are only referenced by the inactive element
    assert_eq!(dof_map.num_dofs(), 4);
    assert_eq!(dof_map.dof_indices_for_field(0, 0), &[0, 1, 3, 2]);
    assert!(dof_map.dof_indices_for_field(1, 0).is_empty());
    assert_eq!(dof_map.num_element_dofs(1), 0);
    assert_eq!(dof_map.node_dof(2, 0), None);
    assert_eq!(dof_map.node_dof(5, 0), None);
}

#[test]
fn unsupported_basis_order_is_rejected() {
    let mesh = create_unit_square_uniform_quad_mesh_2d::<f64>(2);
    let err = DofMap::build(&mesh, &taylor_hood_fields()).unwrap_err();
    assert_eq!(
        err.downcast_ref::<AssemblyError>(),
        Some(&AssemblyError::UnsupportedBasisOrder {
            element_index: 0,
            field: "u".to_string(),
            order: BasisOrder::Second,
        })
    );
}
