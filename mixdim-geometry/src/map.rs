//! Mapping of lower-dimensional grids to a local reference frame.
//!
//! A grid of dimension `d < 3` lives on a line or plane embedded in 3D. [`map_grid`] rotates the
//! grid so that this line or plane is spanned by coordinate axes, and reports which axes remain
//! *active*. All geometric quantities are returned in the reduced `d`-dimensional coordinates.
use crate::grid::{plane_normal, Grid};
use crate::Real;
use log::debug;
use nalgebra::{DMatrix, Matrix3, Point3, Rotation3, Unit, Vector3};
use numeric_literals::replace_float_literals;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// The grid does not lie on a line (1D) or plane (2D), so the number of active axes after
    /// rotation differs from the grid dimension.
    NonPlanar { dim: usize, active_axes: usize },
}

impl fmt::Display for MappingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPlanar { dim, active_axes } => write!(
                f,
                "Grid of dimension {} has {} active axes after rotation to reference frame",
                dim, active_axes
            ),
        }
    }
}

impl Error for MappingError {}

/// Geometry of a grid expressed in its local reference frame.
///
/// Coordinate matrices have one row per active axis and one column per entity.
#[derive(Debug, Clone, PartialEq)]
pub struct GridMapping<T: Real> {
    pub cell_centers: DMatrix<T>,
    pub face_normals: DMatrix<T>,
    pub face_centers: DMatrix<T>,
    /// Rotation from global to local coordinates.
    pub rotation: Matrix3<T>,
    pub active_dims: [bool; 3],
    pub nodes: DMatrix<T>,
}

impl<T: Real> GridMapping<T> {
    /// Indices of the active axes, in increasing order.
    pub fn active_axes(&self) -> Vec<usize> {
        (0..3).filter(|&axis| self.active_dims[axis]).collect()
    }
}

/// Rotation taking `from` onto `to`.
///
/// Antiparallel vectors are handled with a half turn about an axis orthogonal to `from`.
#[replace_float_literals(T::from_f64(literal).unwrap())]
pub fn rotation_onto<T: Real>(from: &Vector3<T>, to: &Vector3<T>) -> Matrix3<T> {
    Rotation3::rotation_between(from, to)
        .unwrap_or_else(|| {
            let helper = if from.x.abs() < 0.9 { Vector3::x() } else { Vector3::y() };
            let axis = Unit::new_normalize(from.cross(&helper));
            Rotation3::from_axis_angle(&axis, T::pi())
        })
        .into_inner()
}

/// Computes the geometry of `grid` in its local reference frame.
///
/// For 3D grids the rotation is the identity and all axes are active. For 2D grids the plane
/// normal is rotated onto `e_z`, and for 1D grids the line tangent is rotated onto `e_x`. The
/// 0D grid maps to an identity rotation without active axes.
pub fn map_grid<T: Real>(grid: &Grid<T>) -> Result<GridMapping<T>, MappingError> {
    let dim = grid.dim();
    let rotation = match dim {
        1 => match grid.face_normals().first() {
            Some(tangent) => rotation_onto(tangent, &Vector3::x()),
            None => Matrix3::identity(),
        },
        2 => {
            let first_cell_nodes: Vec<_> = if grid.num_cells() > 0 {
                grid.cell_nodes(0).iter().map(|&node| grid.nodes()[node]).collect()
            } else {
                Vec::new()
            };
            match plane_normal(&first_cell_nodes) {
                Some(normal) => rotation_onto(&normal, &Vector3::z()),
                None => Matrix3::identity(),
            }
        }
        _ => Matrix3::identity(),
    };

    let active_dims = match dim {
        0 => [false; 3],
        3 => [true; 3],
        _ => {
            let active_dims = detect_active_dims(&rotation, grid.face_centers());
            let active_axes = active_dims.iter().filter(|&&active| active).count();
            if active_axes != dim {
                return Err(MappingError::NonPlanar { dim, active_axes });
            }
            active_dims
        }
    };
    debug!("Mapped grid of dimension {} with active axes {:?}", dim, active_dims);

    let axes: Vec<usize> = (0..3).filter(|&axis| active_dims[axis]).collect();
    let coords = |points: &[Point3<T>]| project(&rotation, &axes, points.iter().map(|p| p.coords));

    Ok(GridMapping {
        cell_centers: coords(grid.cell_centers()),
        face_normals: project(&rotation, &axes, grid.face_normals().iter().copied()),
        face_centers: coords(grid.face_centers()),
        rotation,
        active_dims,
        nodes: coords(grid.nodes()),
    })
}

/// Rotates each vector and keeps the given axes, producing one column per vector.
fn project<T: Real>(
    rotation: &Matrix3<T>,
    axes: &[usize],
    vectors: impl ExactSizeIterator<Item = Vector3<T>>,
) -> DMatrix<T> {
    let mut result = DMatrix::zeros(axes.len(), vectors.len());
    for (col, v) in vectors.enumerate() {
        let rotated = rotation * v;
        for (row, &axis) in axes.iter().enumerate() {
            result[(row, col)] = rotated[axis];
        }
    }
    result
}

/// Axes along which the rotated points vary by more than a small fraction of the total variation.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn detect_active_dims<T: Real>(rotation: &Matrix3<T>, points: &[Point3<T>]) -> [bool; 3] {
    let rotated: Vec<Vector3<T>> = points.iter().map(|p| rotation * p.coords).collect();
    let mut variation = Vector3::zeros();
    if let Some(first) = rotated.first() {
        for p in &rotated {
            variation += (p - first).map(|x| x.abs());
        }
    }
    let total = variation.sum();
    if total <= T::zero() {
        return [false; 3];
    }
    let relative = variation / total;
    [relative.x > 1e-8, relative.y > 1e-8, relative.z > 1e-8]
}
