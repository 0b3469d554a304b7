//! Cell-level RT0 quantities.
//!
//! The lowest-order Raviart-Thomas basis function of face `f` in a simplex `T` of dimension `d`
//! is `φ_f(x) = s_f (x - p_f) / (d |T|)`, where `p_f` is the node opposite to `f` and `s_f` the
//! orientation of `f` relative to `T`. The local mass matrix `∫_T φ_i · K⁻¹ φ_j` is evaluated
//! exactly by writing `x - p_j` in barycentric coordinates, which gives the quadrature weights
//! collected in [`hb_matrix`].
use crate::Rt0Error;
use itertools::Itertools;
use mixdim_geometry::Real;
use nalgebra::DMatrix;
use nalgebra_sparse::pattern::SparsityPattern;
use numeric_literals::replace_float_literals;

/// The exact barycentric quadrature weights of dimension `dim`.
///
/// The matrix has size `dim (dim + 1)`. Entry `(i, j)` is `2` on the diagonal, `1` if `i - j`
/// is a non-zero multiple of `dim` and `0` otherwise, all scaled by
/// `1 / (dim² (dim + 1) (dim + 2))`.
///
/// # Panics
///
/// Panics if `dim == 0`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn hb_matrix<T: Real>(dim: usize) -> DMatrix<T> {
    assert!(dim > 0, "Weights are only defined for positive dimensions.");
    let size = dim * (dim + 1);
    let scale = T::from_usize(dim * dim * (dim + 1) * (dim + 2)).expect("Dimension must fit in T");
    DMatrix::from_fn(size, size, |i, j| {
        let value = if i == j {
            2.0
        } else if i.abs_diff(j) % dim == 0 {
            1.0
        } else {
            0.0
        };
        value / scale
    })
}

/// The local H(div) mass matrix of a simplex cell.
///
/// - `k`: the `d x d` (aperture-scaled) permeability of the cell.
/// - `volume`: the cell volume.
/// - `opposite_coords`: `d x (d + 1)` local coordinates of the node opposite to each face.
/// - `signs`: orientation of each face relative to the cell.
/// - `hb`: the weights of [`hb_matrix`] for dimension `d`.
///
/// Returns `None` if `k` is not invertible.
pub fn mass_hdiv<T: Real>(
    k: &DMatrix<T>,
    volume: T,
    opposite_coords: &DMatrix<T>,
    signs: &[T],
    hb: &DMatrix<T>,
) -> Option<DMatrix<T>> {
    let dim = k.nrows();
    let num_faces = dim + 1;
    assert_eq!(opposite_coords.shape(), (dim, num_faces), "Need one opposite node per face.");
    assert_eq!(signs.len(), num_faces, "Need one sign per face.");

    let k_inv = k.clone().try_inverse()? / volume;
    let mut k_inv_block = DMatrix::zeros(dim * num_faces, dim * num_faces);
    for block in 0..num_faces {
        k_inv_block
            .view_mut((block * dim, block * dim), (dim, dim))
            .copy_from(&k_inv);
    }

    // Column j holds the vectors from node j to every other node, scaled by the orientation
    let mut n = DMatrix::from_fn(dim * num_faces, num_faces, |row, j| {
        let (i, axis) = (row / dim, row % dim);
        opposite_coords[(axis, i)] - opposite_coords[(axis, j)]
    });
    for (mut column, &sign) in n.column_iter_mut().zip(signs) {
        column *= sign;
    }

    Some(n.transpose() * hb * k_inv_block * n)
}

/// For each of the given faces of a cell, the node of the cell that does not belong to the face.
///
/// Fails with [`Rt0Error::NonSimplicialCell`] if a face does not miss exactly one node of the
/// cell, or if the cell does not have `dim + 1` faces and `dim + 1` nodes. In the latter case the
/// first face of the cell is reported (face `0` for an empty face list).
pub fn opposite_side_nodes(
    face_nodes: &SparsityPattern,
    cell_faces: &[usize],
    dim: usize,
) -> Result<Vec<usize>, Rt0Error> {
    let cell_nodes: Vec<usize> = cell_faces
        .iter()
        .flat_map(|&face| face_nodes.lane(face).iter().copied())
        .sorted_unstable()
        .dedup()
        .collect();

    let opposite = cell_faces
        .iter()
        .map(|&face| {
            let nodes = face_nodes.lane(face);
            let mut candidates = cell_nodes.iter().filter(|&&node| !nodes.contains(&node));
            match (candidates.next(), candidates.count()) {
                (Some(&node), 0) => Ok(node),
                (first, rest) => Err(Rt0Error::NonSimplicialCell {
                    face,
                    num_candidates: first.map_or(0, |_| 1 + rest),
                }),
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    if cell_faces.len() != dim + 1 || cell_nodes.len() != dim + 1 {
        let (face, num_candidates) = match cell_faces.first() {
            Some(&face) => (face, 1),
            None => (0, 0),
        };
        return Err(Rt0Error::NonSimplicialCell { face, num_candidates });
    }
    Ok(opposite)
}
