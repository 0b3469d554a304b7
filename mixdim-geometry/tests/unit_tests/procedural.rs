use matrixcompare::assert_scalar_eq;
use mixdim_geometry::procedural::{
    create_line_grid, create_unit_cube_tet_grid, create_unit_interval_grid, create_unit_square_tri_grid,
};
use mixdim_geometry::Grid;
use nalgebra::Point3;

#[test]
fn unit_interval_grid() {
    let grid: Grid<f64> = create_unit_interval_grid(4);
    assert_eq!(grid.dim(), 1);
    assert_eq!(grid.num_cells(), 4);
    assert_eq!(grid.num_faces(), 5);
    assert_eq!(grid.boundary_faces().len(), 2);
    for &volume in grid.cell_volumes() {
        assert_scalar_eq!(volume, 0.25, comp = abs, tol = 1e-14);
    }
    assert!(grid.face_areas().iter().all(|&area| (area - 1.0).abs() < 1e-14));
}

#[test]
fn tilted_line_grid_has_physical_lengths() {
    let grid: Grid<f64> = create_line_grid(Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 3.0, 4.0), 5);
    let length: f64 = grid.cell_volumes().iter().sum();
    assert_scalar_eq!(length, 5.0, comp = abs, tol = 1e-12);
}

#[test]
fn unit_cube_tet_grid() {
    let grid: Grid<f64> = create_unit_cube_tet_grid(2);
    assert_eq!(grid.num_nodes(), 27);
    assert_eq!(grid.num_cells(), 48);
    // Two triangles per square on each of the six sides of the cube
    assert_eq!(grid.boundary_faces().len(), 6 * 4 * 2);

    let total_volume: f64 = grid.cell_volumes().iter().sum();
    assert_scalar_eq!(total_volume, 1.0, comp = abs, tol = 1e-12);
    for &volume in grid.cell_volumes() {
        assert_scalar_eq!(volume, 1.0 / 48.0, comp = abs, tol = 1e-14);
    }
}

#[test]
fn grids_without_cells() {
    let interval: Grid<f64> = create_unit_interval_grid(0);
    let square: Grid<f64> = create_unit_square_tri_grid(0);
    let cube: Grid<f64> = create_unit_cube_tet_grid(0);
    for grid in [&interval, &square, &cube] {
        assert_eq!(grid.num_cells(), 0);
        assert_eq!(grid.num_faces(), 0);
        assert_eq!(grid.num_nodes(), 1);
        assert_eq!(grid.nodes()[0], Point3::origin());
        assert!(grid.boundary_faces().is_empty());
    }
}
