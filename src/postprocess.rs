//! Reconstruction of cell-wise velocities from face fluxes.
use crate::assembly::local::opposite_side_nodes;
use crate::error::check_len;
use crate::Rt0Error;
use mixdim_geometry::{Grid, GridMapping, Real};
use nalgebra::{DVector, Matrix3xX, Vector3};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// Evaluates the RT0 velocity at the center of every cell.
///
/// The velocity is computed in the local frame of `mapping`, scaled by the aperture of the cell
/// and rotated back to the global frame. The result has one column per cell. Rows of inactive
/// axes are zero if the grid is aligned with the coordinate axes. Errors refer to the
/// lowest-indexed failing cell.
pub fn project_flux<T: Real>(
    grid: &Grid<T>,
    mapping: &GridMapping<T>,
    flux: &DVector<T>,
    aperture: &[T],
) -> Result<Matrix3xX<T>, Rt0Error> {
    check_len("face fluxes", grid.num_faces(), flux.len())?;
    check_len("aperture cells", grid.num_cells(), aperture.len())?;

    let axes = mapping.active_axes();
    let rotation_transpose = mapping.rotation.transpose();
    let velocities = (0..grid.num_cells())
        .into_par_iter()
        .map(|cell| -> Result<Vector3<T>, Rt0Error> {
            let local = cell_velocity(grid, mapping, flux, cell)? * aperture[cell];
            let mut velocity = Vector3::zeros();
            for (row, &axis) in axes.iter().enumerate() {
                velocity[axis] = local[row];
            }
            Ok(rotation_transpose * velocity)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let mut result = Matrix3xX::zeros(grid.num_cells());
    for (cell, velocity) in velocities.iter().enumerate() {
        result.set_column(cell, velocity);
    }
    Ok(result)
}

fn cell_velocity<T: Real>(
    grid: &Grid<T>,
    mapping: &GridMapping<T>,
    flux: &DVector<T>,
    cell: usize,
) -> Result<DVector<T>, Rt0Error> {
    let faces = grid.cell_face_indices(cell);
    let nodes = opposite_side_nodes(grid.face_nodes(), faces, grid.dim())?;
    let center = mapping.cell_centers.column(cell);

    let mut velocity = DVector::zeros(mapping.nodes.nrows());
    for (&face, &node) in faces.iter().zip(&nodes) {
        let node_coords = mapping.nodes.column(node);
        let to_center = center - node_coords;
        let to_face = mapping.face_centers.column(face) - node_coords;
        let normal_distance = to_face.dot(&mapping.face_normals.column(face));
        velocity += to_center * (flux[face] / normal_distance);
    }
    Ok(velocity)
}
