//! Global assembly of the saddle-point matrix and of the boundary terms.
//!
//! Unknowns are ordered with one flux per face first, followed by one pressure per cell.
use crate::assembly::local::{hb_matrix, mass_hdiv, opposite_side_nodes};
use crate::error::check_len;
use crate::params::{BoundaryCondition, SecondOrderTensor};
use crate::Rt0Error;
use log::{trace, warn};
use mixdim_geometry::{Grid, GridMapping, Real};
use mixdim_sparse::{add_to_diagonal, clear_row_and_set_diagonal, csr_from_triplets_with_diagonal};
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::{CooMatrix, CsrMatrix};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Assembles the `num_faces x num_faces` H(div) mass matrix.
///
/// `tensor` must be expressed in the local frame of `mapping`, with at least `dim` rows. Only its
/// leading `dim x dim` block is used, scaled by the aperture of each cell. If several cells fail,
/// the error of the lowest-indexed one is returned.
///
/// # Panics
///
/// Panics if the grid is 0-dimensional.
pub fn assemble_mass_matrix<T: Real>(
    grid: &Grid<T>,
    mapping: &GridMapping<T>,
    tensor: &SecondOrderTensor<T>,
    aperture: &[T],
) -> Result<CsrMatrix<T>, Rt0Error> {
    let dim = grid.dim();
    check_len("permeability cells", grid.num_cells(), tensor.num_cells())?;
    check_len("aperture cells", grid.num_cells(), aperture.len())?;
    if tensor.dim() < dim {
        return Err(Rt0Error::DimensionMismatch {
            what: "permeability dimension",
            expected: dim,
            actual: tensor.dim(),
        });
    }

    let hb = hb_matrix(dim);
    let local_matrices = (0..grid.num_cells())
        .into_par_iter()
        .map(|cell| {
            let k = tensor.cell_tensor(cell).view((0, 0), (dim, dim)) * aperture[cell];
            cell_mass_matrix(grid, mapping, &k, &hb, cell)
        })
        .collect::<Vec<_>>()
        .into_iter()
        // Sequential collection reports the lowest failing cell
        .collect::<Result<Vec<_>, _>>()?;

    let triplets = local_matrices.iter().enumerate().flat_map(|(cell, a)| {
        let faces = grid.cell_face_indices(cell);
        faces.iter().enumerate().flat_map(move |(i, &face_i)| {
            faces
                .iter()
                .enumerate()
                .map(move |(j, &face_j)| (face_i, face_j, a[(i, j)]))
        })
    });
    Ok(csr_from_triplets_with_diagonal(grid.num_faces(), triplets))
}

fn cell_mass_matrix<T: Real>(
    grid: &Grid<T>,
    mapping: &GridMapping<T>,
    k: &DMatrix<T>,
    hb: &DMatrix<T>,
    cell: usize,
) -> Result<DMatrix<T>, Rt0Error> {
    let faces = grid.cell_face_indices(cell);
    let nodes = opposite_side_nodes(grid.face_nodes(), faces, grid.dim())?;
    let coords = mapping.nodes.select_columns(&nodes);
    mass_hdiv(k, grid.cell_volumes()[cell], &coords, grid.cell_face_signs(cell), hb)
        .ok_or(Rt0Error::SingularPermeability { cell })
}

/// The `num_cells x num_faces` divergence operator `-cell_facesᵀ`.
pub fn divergence_matrix<T: Real>(grid: &Grid<T>) -> CsrMatrix<T> {
    let mut coo = CooMatrix::new(grid.num_cells(), grid.num_faces());
    for (face, cell, &sign) in grid.cell_faces().triplet_iter() {
        coo.push(cell, face, -sign);
    }
    CsrMatrix::from(&coo)
}

/// The orientation of each face relative to its lowest-indexed adjacent cell.
///
/// Faces without adjacent cells get a zero sign.
pub fn face_signs<T: Real>(grid: &Grid<T>) -> Vec<T> {
    let mut signs = vec![None; grid.num_faces()];
    for cell in 0..grid.num_cells() {
        for (&face, &sign) in grid.cell_face_indices(cell).iter().zip(grid.cell_face_signs(cell)) {
            signs[face].get_or_insert(sign);
        }
    }
    signs
        .into_iter()
        .map(|sign| sign.unwrap_or_else(T::zero))
        .collect()
}

/// Imposes Neumann and Robin conditions on the face rows of an assembled saddle-point matrix.
///
/// Neumann rows are cleared and get `weight` on the diagonal. Robin faces get
/// `1 / (robin_weight * face_area)` added to the diagonal. Internal faces are left untouched.
pub fn apply_boundary_conditions<T: Real>(
    matrix: &mut CsrMatrix<T>,
    grid: &Grid<T>,
    bc: &BoundaryCondition<T>,
    weight: T,
) -> Result<(), Rt0Error> {
    check_len("boundary condition faces", grid.num_faces(), bc.num_faces())?;

    let neumann_faces = bc.neumann_faces();
    for &face in &neumann_faces {
        clear_row_and_set_diagonal(matrix, face, weight)?;
    }

    let robin_faces = bc.robin_faces();
    let robin_terms = robin_faces
        .iter()
        .map(|&face| (face, T::one() / (bc.robin_weight()[face] * grid.face_areas()[face])));
    add_to_diagonal(matrix, robin_terms)?;

    trace!(
        "Imposed {} Neumann and {} Robin conditions",
        neumann_faces.len(),
        robin_faces.len()
    );
    Ok(())
}

/// The boundary contribution to the right-hand side, with `num_faces + num_cells` entries.
///
/// Dirichlet and Robin values are accumulated, Neumann values overwrite. Internal faces are
/// treated as homogeneous Dirichlet faces and receive nothing.
pub fn boundary_rhs<T: Real>(
    grid: &Grid<T>,
    bc: &BoundaryCondition<T>,
    bc_values: &DVector<T>,
    weight: T,
) -> Result<DVector<T>, Rt0Error> {
    check_len("boundary condition faces", grid.num_faces(), bc.num_faces())?;
    check_len("boundary values", grid.num_faces(), bc_values.len())?;

    let ignored_internal_values = bc
        .is_internal()
        .iter()
        .zip(bc_values.iter())
        .filter(|(&internal, &value)| internal && value != T::zero())
        .count();
    if ignored_internal_values > 0 {
        warn!(
            "Ignoring non-zero boundary values on {} internal faces",
            ignored_internal_values
        );
    }

    let signs = face_signs(grid);
    let mut rhs = DVector::zeros(grid.num_faces() + grid.num_cells());
    for face in bc.dirichlet_faces() {
        rhs[face] -= signs[face] * bc_values[face];
    }
    for face in bc.robin_faces() {
        rhs[face] -= signs[face] * bc_values[face] / bc.robin_weight()[face];
    }
    for face in bc.neumann_faces() {
        rhs[face] = signs[face] * weight * bc_values[face];
    }
    Ok(rhs)
}
