use matrixcompare::assert_matrix_eq;
use mixfem::assembly::global::{CsrAssembler, CsrParAssembler};
use mixfem::assembly::local::{ElementConnectivityAssembler, ElementSystemAssembler, LocalBlockSystem};
use mixfem::error::AssemblyError;
use mixfem::nalgebra::{DMatrix, DVector};
use mixfem::nalgebra_sparse::CsrMatrix;
use proptest::collection::vec;
use proptest::prelude::*;

/// Every element contributes `element_index + 1` to each entry of its local matrix and
/// `1` to each entry of its local vector.
#[derive(Debug)]
struct MockElementAssembler {
    num_dofs: usize,
    element_dofs: Vec<Vec<usize>>,
    inactive: Vec<usize>,
}

impl ElementConnectivityAssembler for MockElementAssembler {
    fn num_dofs(&self) -> usize {
        self.num_dofs
    }

    fn num_elements(&self) -> usize {
        self.element_dofs.len()
    }

    fn is_active(&self, element_index: usize) -> bool {
        !self.inactive.contains(&element_index)
    }

    fn element_dof_count(&self, element_index: usize) -> usize {
        self.element_dofs[element_index].len()
    }

    fn populate_element_dofs(&self, output: &mut [usize], element_index: usize) {
        output.copy_from_slice(&self.element_dofs[element_index]);
    }
}

impl ElementSystemAssembler<f64> for MockElementAssembler {
    fn assemble_element_system_into(&self, element_index: usize, output: &mut LocalBlockSystem<f64>) -> eyre::Result<()> {
        let n = self.element_dofs[element_index].len();
        output.resize(&[n]);
        let value = (element_index + 1) as f64;
        let mut block = output.block_mut(0, 0);
        for i in 0..n {
            for j in 0..n {
                block[(i, j)] += value;
            }
        }
        let mut vector = output.subvector_mut(0);
        for i in 0..n {
            vector[i] += 1.0;
        }
        Ok(())
    }
}

/// Dense reference assembly of the mock.
fn assemble_dense(assembler: &MockElementAssembler) -> (DMatrix<f64>, DVector<f64>) {
    let n = assembler.num_dofs;
    let mut matrix = DMatrix::zeros(n, n);
    let mut rhs = DVector::zeros(n);
    for (element_index, dofs) in assembler.element_dofs.iter().enumerate() {
        if !assembler.is_active(element_index) {
            continue;
        }
        for &i in dofs {
            rhs[i] += 1.0;
            for &j in dofs {
                matrix[(i, j)] += (element_index + 1) as f64;
            }
        }
    }
    (matrix, rhs)
}

#[test]
fn csr_assemble_mock_pattern() {
    // No elements
    {
        let assembler = MockElementAssembler {
            num_dofs: 3,
            element_dofs: vec![],
            inactive: vec![],
        };
        let pattern = CsrAssembler::<f64>::default()
            .assemble_pattern(&assembler)
            .unwrap();
        assert_eq!(pattern.major_dim(), 3);
        assert_eq!(pattern.minor_dim(), 3);
        assert_eq!(pattern.nnz(), 0);
    }

    // Two elements sharing a DOF, one DOF without elements
    {
        let assembler = MockElementAssembler {
            num_dofs: 4,
            element_dofs: vec![vec![1, 0], vec![2, 1]],
            inactive: vec![],
        };
        let pattern = CsrAssembler::<f64>::default()
            .assemble_pattern(&assembler)
            .unwrap();
        assert_eq!(pattern.lane(0), &[0, 1]);
        assert_eq!(pattern.lane(1), &[0, 1, 2]);
        assert_eq!(pattern.lane(2), &[1, 2]);
        assert!(pattern.lane(3).is_empty());

        let par_pattern = CsrParAssembler::<f64>::default()
            .assemble_pattern(&assembler)
            .unwrap();
        assert_eq!(par_pattern, pattern);
    }

    // Inactive elements do not contribute
    {
        let assembler = MockElementAssembler {
            num_dofs: 4,
            element_dofs: vec![vec![1, 0], vec![2, 3]],
            inactive: vec![1],
        };
        let pattern = CsrAssembler::<f64>::default()
            .assemble_pattern(&assembler)
            .unwrap();
        assert_eq!(pattern.nnz(), 4);
        assert!(pattern.lane(2).is_empty());
        assert!(pattern.lane(3).is_empty());
    }
}

#[test]
fn csr_assemble_mock_system() {
    let assembler = MockElementAssembler {
        num_dofs: 5,
        element_dofs: vec![vec![0, 1, 3], vec![3, 1, 2], vec![4, 2]],
        inactive: vec![],
    };
    let system = CsrAssembler::<f64>::default().assemble(&assembler).unwrap();
    let (expected_matrix, expected_rhs) = assemble_dense(&assembler);

    #[rustfmt::skip]
    let hand_computed = DMatrix::from_row_slice(5, 5, &[
        1.0, 1.0, 0.0, 1.0, 0.0,
        1.0, 3.0, 2.0, 3.0, 0.0,
        0.0, 2.0, 5.0, 2.0, 3.0,
        1.0, 3.0, 2.0, 3.0, 0.0,
        0.0, 0.0, 3.0, 0.0, 3.0,
    ]);
    assert_eq!(expected_matrix, hand_computed);
    assert_matrix_eq!(DMatrix::from(&system.matrix), expected_matrix);
    assert_eq!(system.rhs, expected_rhs);
}

#[test]
fn csr_assemble_into_is_additive() {
    let assembler = MockElementAssembler {
        num_dofs: 3,
        element_dofs: vec![vec![0, 1], vec![1, 2]],
        inactive: vec![],
    };
    let csr_assembler = CsrAssembler::<f64>::default();
    let mut system = csr_assembler.assemble(&assembler).unwrap();
    csr_assembler
        .assemble_into(&mut system.matrix, &mut system.rhs, &assembler)
        .unwrap();

    let (matrix, rhs) = assemble_dense(&assembler);
    assert_matrix_eq!(DMatrix::from(&system.matrix), 2.0 * matrix);
    assert_eq!(system.rhs, 2.0 * rhs);
}

#[test]
fn csr_assemble_into_reports_missing_sparsity_entry() {
    let assembler = MockElementAssembler {
        num_dofs: 3,
        element_dofs: vec![vec![0, 2]],
        inactive: vec![],
    };
    let mut matrix = CsrMatrix::identity(3);
    let mut rhs = DVector::zeros(3);

    let err = CsrAssembler::<f64>::default()
        .assemble_into(&mut matrix, &mut rhs, &assembler)
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<AssemblyError>(),
        Some(&AssemblyError::MissingSparsityEntry { row: 0, col: 2 })
    );

    let err = CsrParAssembler::<f64>::default()
        .assemble_into(&mut matrix, &mut rhs, &assembler)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::MissingSparsityEntry { .. })
    ));
}

#[test]
fn csr_assemble_into_rejects_mismatched_dimensions() {
    let assembler = MockElementAssembler {
        num_dofs: 3,
        element_dofs: vec![vec![0, 1, 2]],
        inactive: vec![],
    };
    let mut matrix = CsrAssembler::<f64>::default().assemble(&assembler).unwrap().matrix;
    let mut rhs = DVector::zeros(2);

    let err = CsrAssembler::<f64>::default()
        .assemble_into(&mut matrix, &mut rhs, &assembler)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AssemblyError>(),
        Some(AssemblyError::DimensionMismatch { .. })
    ));
}

fn mock_assembler_strategy() -> impl Strategy<Value = MockElementAssembler> {
    (1usize..12)
        .prop_flat_map(|num_dofs| {
            let element_dofs = vec(
                proptest::sample::subsequence((0..num_dofs).collect::<Vec<_>>(), 1..=num_dofs.min(4))
                    .prop_shuffle(),
                0..10,
            );
            (Just(num_dofs), element_dofs, vec(0usize..10, 0..3))
        })
        .prop_map(|(num_dofs, element_dofs, inactive)| MockElementAssembler {
            num_dofs,
            element_dofs,
            inactive,
        })
}

proptest! {
    #[test]
    fn serial_and_parallel_assembly_agree_with_dense_reference(
        assembler in mock_assembler_strategy(),
        num_partitions in 1usize..6
    ) {
        let (expected_matrix, expected_rhs) = assemble_dense(&assembler);

        let serial = CsrAssembler::<f64>::default().assemble(&assembler).unwrap();
        let parallel = CsrParAssembler::<f64>::default()
            .with_num_partitions(Some(num_partitions))
            .assemble(&assembler)
            .unwrap();

        // Integer-valued contributions are summed exactly in any order
        prop_assert_eq!(&serial, &parallel);
        prop_assert_eq!(DMatrix::from(&serial.matrix), expected_matrix);
        prop_assert_eq!(serial.rhs, expected_rhs);
    }
}
