use matrixcompare::assert_matrix_eq;
use mixdim::geometry::map::rotation_onto;
use mixdim::geometry::procedural::{create_unit_interval_grid, create_unit_square_tri_grid};
use mixdim::{BcKind, BoundaryCondition, Parameters, Rt0Error, SecondOrderTensor};
use nalgebra::{DMatrix, DVector, Vector3};

#[test]
fn isotropic_and_diagonal_tensors() {
    let iso = SecondOrderTensor::isotropic(&[1.0, 3.0]);
    assert_eq!(iso.num_cells(), 2);
    assert_eq!(iso.dim(), 3);
    assert_eq!(iso.cell_tensor(1), &DMatrix::from_diagonal_element(3, 3, 3.0));

    let diag = SecondOrderTensor::diagonal(&[1.0], &[2.0], &[3.0]);
    let expected = DMatrix::from_diagonal(&DVector::from_column_slice(&[1.0, 2.0, 3.0]));
    assert_eq!(diag.cell_tensor(0), &expected);
}

#[test]
#[should_panic]
fn diagonal_tensor_requires_equal_lengths() {
    SecondOrderTensor::diagonal(&[1.0, 1.0], &[2.0], &[3.0, 3.0]);
}

#[test]
fn from_matrices_requires_square_tensors_of_equal_size() {
    let ok = SecondOrderTensor::from_matrices(vec![DMatrix::<f64>::identity(2, 2); 3]).unwrap();
    assert_eq!(ok.dim(), 2);

    let non_square = SecondOrderTensor::from_matrices(vec![DMatrix::<f64>::zeros(2, 3)]);
    assert_eq!(
        non_square,
        Err(Rt0Error::DimensionMismatch {
            what: "tensor columns",
            expected: 2,
            actual: 3
        })
    );

    let mixed = SecondOrderTensor::from_matrices(vec![DMatrix::<f64>::identity(3, 3), DMatrix::identity(2, 2)]);
    assert!(matches!(mixed, Err(Rt0Error::DimensionMismatch { what: "tensor rows", .. })));

    let empty = SecondOrderTensor::<f64>::from_matrices(Vec::new()).unwrap();
    assert_eq!(empty.num_cells(), 0);
}

#[test]
fn rotation_returns_new_tensor() {
    let k = SecondOrderTensor::diagonal(&[1.0], &[2.0], &[3.0]);
    let before = k.clone();

    // Quarter turn about z swaps the x and y principal values
    let rotation = rotation_onto(&Vector3::x(), &Vector3::y());
    let rotated = k.rotated(&rotation).unwrap();
    let expected = DMatrix::from_diagonal(&DVector::from_column_slice(&[2.0, 1.0, 3.0]));
    assert_matrix_eq!(rotated.cell_tensor(0).clone(), expected, comp = abs, tol = 1e-14);
    assert_eq!(k, before);
}

#[test]
fn restriction_keeps_active_axes() {
    #[rustfmt::skip]
    let k = DMatrix::from_row_slice(3, 3, &[
        1.0, 2.0, 3.0,
        4.0, 5.0, 6.0,
        7.0, 8.0, 9.0,
    ]);
    let tensor = SecondOrderTensor::from_matrices(vec![k]).unwrap();

    let xz = tensor.restricted(&[true, false, true]).unwrap();
    assert_eq!(xz.cell_tensor(0), &DMatrix::from_row_slice(2, 2, &[1.0, 3.0, 7.0, 9.0]));

    let y = tensor.restricted(&[false, true, false]).unwrap();
    assert_eq!(y.cell_tensor(0), &DMatrix::from_element(1, 1, 5.0));

    // Already restricted tensors can not be restricted again
    assert!(matches!(
        xz.restricted(&[true, true, false]),
        Err(Rt0Error::DimensionMismatch { .. })
    ));
}

#[test]
fn default_boundary_condition_is_neumann_on_boundary() {
    let grid = create_unit_square_tri_grid::<f64>(2);
    let bc = BoundaryCondition::new(&grid, &[]);
    assert_eq!(bc.num_faces(), grid.num_faces());
    assert_eq!(bc.neumann_faces(), grid.boundary_faces());
    assert!(bc.dirichlet_faces().is_empty());
    assert!(bc.robin_faces().is_empty());
    assert!(bc.robin_weight().iter().all(|&w| w == 1.0));

    let interior = (0..grid.num_faces())
        .find(|face| !grid.boundary_faces().contains(face))
        .unwrap();
    assert_eq!(bc.kind(interior), None);
}

#[test]
fn setting_a_kind_replaces_the_previous_one() {
    let grid = create_unit_interval_grid::<f64>(2);
    let mut bc = BoundaryCondition::new(&grid, &[]);
    assert_eq!(bc.kind(1), Some(BcKind::Neumann));

    bc.set(1, BcKind::Robin { weight: 0.5 });
    assert_eq!(bc.kind(1), Some(BcKind::Robin { weight: 0.5 }));
    assert_eq!((bc.is_dir()[1], bc.is_neu()[1], bc.is_rob()[1]), (false, false, true));

    bc.set(1, BcKind::Dirichlet);
    assert_eq!(bc.kind(1), Some(BcKind::Dirichlet));
    assert_eq!((bc.is_dir()[1], bc.is_neu()[1], bc.is_rob()[1]), (true, false, false));
    // The weight of a former Robin face is kept, but no longer used
    assert_eq!(bc.robin_weight()[1], 0.5);

    let bc = bc.with_kind([0, 2], BcKind::Neumann);
    assert_eq!(bc.neumann_faces(), vec![0, 2]);
    assert_eq!(bc.dirichlet_faces(), vec![1]);
}

#[test]
fn internal_faces_are_excluded_from_face_lists() {
    let grid = create_unit_interval_grid::<f64>(2);
    let bc = BoundaryCondition::new(&grid, &[1])
        .with_kind([0], BcKind::Dirichlet)
        .with_kind([2], BcKind::Robin { weight: 2.0 });
    assert_eq!(bc.is_internal(), &[false, true, false]);
    assert!(bc.neumann_faces().is_empty());
    assert_eq!(bc.dirichlet_faces(), vec![0]);
    assert_eq!(bc.robin_faces(), vec![2]);

    // The flags of the internal face are still reported
    assert_eq!(bc.kind(1), Some(BcKind::Neumann));
}

#[test]
fn from_flags_rejects_conflicting_and_inconsistent_flags() {
    let conflicting = BoundaryCondition::from_flags(
        vec![false, true, false],
        vec![false, false, false],
        vec![false, true, false],
        vec![false; 3],
        vec![1.0; 3],
    );
    assert_eq!(conflicting, Err(Rt0Error::ConflictingBoundaryCondition { face: 1 }));

    let short = BoundaryCondition::from_flags(vec![false; 3], vec![false; 3], vec![false; 3], vec![false; 2], vec![1.0; 3]);
    assert_eq!(
        short,
        Err(Rt0Error::DimensionMismatch {
            what: "internal flags",
            expected: 3,
            actual: 2
        })
    );

    let ok = BoundaryCondition::from_flags(
        vec![true, false, false],
        vec![false, true, false],
        vec![false, false, true],
        vec![false; 3],
        vec![1.0, 1.0, 4.0],
    )
    .unwrap();
    assert_eq!(ok.kind(0), Some(BcKind::Dirichlet));
    assert_eq!(ok.kind(1), Some(BcKind::Neumann));
    assert_eq!(ok.kind(2), Some(BcKind::Robin { weight: 4.0 }));
}

#[test]
fn parameters_fall_back_to_defaults() {
    let param = Parameters::<f64>::new(4);
    assert_eq!(param.num_cells(), 4);
    assert_eq!(param.tensor("flow").into_owned(), SecondOrderTensor::isotropic(&[1.0; 4]));
    assert_eq!(param.source("flow").into_owned(), DVector::zeros(4));
    assert_eq!(param.aperture().into_owned(), DVector::repeat(4, 1.0));
    assert!(param.bc("flow").is_none());
    assert!(param.bc_values("flow").is_none());
}

#[test]
fn parameters_are_keyed_by_process() {
    let grid = create_unit_interval_grid::<f64>(2);
    let param = Parameters::for_grid(&grid)
        .with_tensor("flow", SecondOrderTensor::isotropic(&[2.0, 3.0]))
        .with_source("transport", DVector::from_column_slice(&[1.0, -1.0]))
        .with_bc("flow", BoundaryCondition::new(&grid, &[]))
        .with_aperture(DVector::from_column_slice(&[0.1, 0.2]));

    assert_eq!(param.tensor("flow").cell_tensor(1)[(0, 0)], 3.0);
    assert_eq!(param.tensor("transport").cell_tensor(1)[(0, 0)], 1.0);
    assert_eq!(param.source("flow").as_slice(), &[0.0, 0.0]);
    assert_eq!(param.source("transport").as_slice(), &[1.0, -1.0]);
    assert!(param.bc("flow").is_some());
    assert!(param.bc("transport").is_none());
    assert_eq!(param.aperture().as_slice(), &[0.1, 0.2]);
}

#[test]
fn boundary_conditions_round_trip_through_json() {
    let grid = create_unit_interval_grid::<f64>(3);
    let bc = BoundaryCondition::new(&grid, &[0]).with_kind([2], BcKind::Robin { weight: 0.25 });
    let json = serde_json::to_string(&bc).unwrap();
    let deserialized: BoundaryCondition<f64> = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, bc);

    let kind: BcKind<f64> = serde_json::from_str(r#"{"Robin":{"weight":3.0}}"#).unwrap();
    assert_eq!(kind, BcKind::Robin { weight: 3.0 });
    let kind: BcKind<f64> = serde_json::from_str(r#""Dirichlet""#).unwrap();
    assert_eq!(kind, BcKind::Dirichlet);
}
