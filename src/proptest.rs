//! Strategies for property-based testing of the discretization.
use ::proptest::collection::vec;
use ::proptest::prelude::*;
use mixdim_geometry::Grid;
use nalgebra::{DMatrix, Point3};

/// Symmetric positive definite matrices of the form `A Aᵀ + I`.
pub fn spd_matrix(dim: usize) -> impl Strategy<Value = DMatrix<f64>> {
    vec(-2.0..2.0, dim * dim).prop_map(move |values| {
        let a = DMatrix::from_vec(dim, dim, values);
        &a * a.transpose() + DMatrix::identity(dim, dim)
    })
}

/// Nodes of the reference simplex of the given dimension, each moved by at most `0.1` along
/// every active axis.
///
/// The perturbation is small enough for the simplex to remain non-degenerate.
pub fn perturbed_reference_simplex(dim: usize) -> impl Strategy<Value = Vec<Point3<f64>>> {
    vec(-0.1..0.1, dim * (dim + 1)).prop_map(move |offsets| {
        (0..=dim)
            .map(|vertex| {
                let mut p = Point3::origin();
                if vertex > 0 {
                    p[vertex - 1] = 1.0;
                }
                for axis in 0..dim {
                    p[axis] += offsets[vertex * dim + axis];
                }
                p
            })
            .collect()
    })
}

/// Single-cell grids made of a perturbed reference simplex.
pub fn simplex_grid(dim: usize) -> impl Strategy<Value = Grid<f64>> {
    perturbed_reference_simplex(dim).prop_map(move |nodes| {
        let cells = vec![(0..=dim).collect::<Vec<_>>()];
        Grid::from_simplices(dim, nodes, &cells).expect("Perturbed simplices are never degenerate")
    })
}
