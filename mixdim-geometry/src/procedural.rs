//! Basic procedural grid generation routines.
use crate::grid::Grid;
use crate::Real;
use itertools::Itertools;
use nalgebra::{Point3, Vector3};

fn coordinate<T: Real>(index: usize, cells_per_dim: usize) -> T {
    let index = T::from_usize(index).expect("Must be able to fit usize in T");
    if cells_per_dim == 0 {
        return T::zero();
    }
    let count = T::from_usize(cells_per_dim).expect("Must be able to fit usize in T");
    index / count
}

/// A uniform 1D grid of the segment between `start` and `end`.
pub fn create_line_grid<T: Real>(start: Point3<T>, end: Point3<T>, num_cells: usize) -> Grid<T> {
    let direction: Vector3<T> = end - start;
    let nodes = (0..=num_cells)
        .map(|i| start + direction * coordinate::<T>(i, num_cells))
        .collect();
    let cells: Vec<_> = (0..num_cells).map(|i| vec![i, i + 1]).collect();
    Grid::from_simplices(1, nodes, &cells).expect("Internal error: line grid must be valid.")
}

/// A uniform 1D grid of the unit interval along the x-axis.
pub fn create_unit_interval_grid<T: Real>(num_cells: usize) -> Grid<T> {
    create_line_grid(Point3::origin(), Point3::new(T::one(), T::zero(), T::zero()), num_cells)
}

/// A uniform triangle grid of the unit square in the xy-plane.
///
/// Every square cell is split into two triangles along the diagonal from its lower-left to its
/// upper-right corner.
pub fn create_unit_square_tri_grid<T: Real>(cells_per_dim: usize) -> Grid<T> {
    let n = cells_per_dim;
    let to_global_vertex_index = |i, j| (n + 1) * j + i;

    let nodes = (0..=n)
        .cartesian_product(0..=n)
        .map(|(j, i)| Point3::new(coordinate(i, n), coordinate(j, n), T::zero()))
        .collect();

    let mut cells = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = to_global_vertex_index(i, j);
            let v10 = to_global_vertex_index(i + 1, j);
            let v11 = to_global_vertex_index(i + 1, j + 1);
            let v01 = to_global_vertex_index(i, j + 1);
            cells.push(vec![v00, v10, v11]);
            cells.push(vec![v00, v11, v01]);
        }
    }
    Grid::from_simplices(2, nodes, &cells).expect("Internal error: triangle grid must be valid.")
}

/// A uniform tetrahedral grid of the unit cube.
///
/// Every cube cell is split into six tetrahedra sharing the main diagonal (Kuhn triangulation),
/// which yields a conforming grid.
pub fn create_unit_cube_tet_grid<T: Real>(cells_per_dim: usize) -> Grid<T> {
    let n = cells_per_dim;
    let to_global_vertex_index = |[i, j, k]: [usize; 3]| (n + 1) * (n + 1) * k + (n + 1) * j + i;

    let nodes = (0..=n)
        .cartesian_product(0..=n)
        .cartesian_product(0..=n)
        .map(|((k, j), i)| Point3::new(coordinate(i, n), coordinate(j, n), coordinate(k, n)))
        .collect();

    let mut cells = Vec::with_capacity(6 * n * n * n);
    for k in 0..n {
        for j in 0..n {
            for i in 0..n {
                for axes in (0..3).permutations(3) {
                    let mut corner = [i, j, k];
                    let mut tet = vec![to_global_vertex_index(corner)];
                    for &axis in &axes {
                        corner[axis] += 1;
                        tet.push(to_global_vertex_index(corner));
                    }
                    cells.push(tet);
                }
            }
        }
    }
    Grid::from_simplices(3, nodes, &cells).expect("Internal error: tetrahedral grid must be valid.")
}

/// A grid consisting of the reference simplex of the given dimension (1, 2 or 3).
///
/// The point grid is returned for dimension 0.
///
/// # Panics
///
/// Panics if `dim > 3`.
pub fn create_reference_simplex_grid<T: Real>(dim: usize) -> Grid<T> {
    assert!(dim <= 3, "Only dimensions up to 3 are supported.");
    if dim == 0 {
        return Grid::point(Point3::origin());
    }
    let nodes = (0..=dim)
        .map(|vertex| {
            let mut p = Point3::origin();
            if vertex > 0 {
                p[vertex - 1] = T::one();
            }
            p
        })
        .collect();
    let cells: Vec<Vec<usize>> = vec![(0..=dim).collect()];
    Grid::from_simplices(dim, nodes, &cells).expect("Internal error: reference simplex must be valid.")
}
