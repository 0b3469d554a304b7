//! The RT0-P0 discretization of Darcy flow.
use crate::assembly::global::{
    apply_boundary_conditions, assemble_mass_matrix, boundary_rhs, divergence_matrix,
};
use crate::dof::DofEntity;
use crate::error::check_len;
use crate::params::Data;
use crate::postprocess;
use crate::Rt0Error;
use log::debug;
use mixdim_geometry::{map_grid, Grid, Real};
use mixdim_sparse::{csr_from_diagonal, infinity_norm, saddle_point_matrix};
use nalgebra::{DVector, DVectorView, Matrix3xX};
use nalgebra_sparse::CsrMatrix;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Discretization of a second-order elliptic equation with lowest-order Raviart-Thomas fluxes
/// and piecewise constant pressures.
///
/// The discretizer holds only the keyword under which its parameters are stored in
/// [`Parameters`](crate::params::Parameters), and may be shared freely between threads.
///
/// On a grid with `F` faces and `C` cells the unknowns are the `F` face fluxes followed by the
/// `C` cell pressures, and the assembled system reads
///
/// ```text
/// [ M   Bᵀ ] [u]   [g]
/// [ B   0  ] [p] = [f]
/// ```
///
/// where `M` is the H(div) mass matrix weighted by the inverse permeability and `B` the negative
/// divergence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rt0 {
    keyword: String,
}

impl Default for Rt0 {
    fn default() -> Self {
        Self::new("flow")
    }
}

impl Rt0 {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The number of unknowns on a grid (faces and cells) or on a mortar grid (cells).
    pub fn ndof(&self, entity: &dyn DofEntity) -> Result<usize, Rt0Error> {
        entity.entity_kind().ndof()
    }

    /// Assembles the saddle-point matrix, including Neumann and Robin conditions.
    ///
    /// If `compute_bc_weight` is set, Neumann rows are scaled by the infinity norm of the mass
    /// matrix, which is returned alongside the matrix. Otherwise the returned weight is one.
    /// Pass the weight on to [`rhs`](Self::rhs) to obtain a consistent right-hand side.
    ///
    /// Errors of individual cells, such as [`Rt0Error::SingularPermeability`], are reported for
    /// the lowest-indexed failing cell.
    pub fn matrix<T: Real>(
        &self,
        grid: &Grid<T>,
        data: &Data<T>,
        compute_bc_weight: bool,
    ) -> Result<(CsrMatrix<T>, T), Rt0Error> {
        if grid.dim() == 0 {
            return Ok((csr_from_diagonal(&[T::one(), T::zero()]), T::one()));
        }

        let param = &data.param;
        let mapping = map_grid(grid)?;
        let tensor = param.tensor(&self.keyword);
        let tensor = if data.is_tangential || grid.dim() == 3 {
            tensor
        } else {
            Cow::Owned(
                tensor
                    .rotated(&mapping.rotation)?
                    .restricted(&mapping.active_dims)?,
            )
        };

        let mass = assemble_mass_matrix(grid, &mapping, &tensor, param.aperture().as_slice())?;
        let weight = if compute_bc_weight {
            infinity_norm(&mass)
        } else {
            T::one()
        };
        let mut matrix = saddle_point_matrix(&mass, &divergence_matrix(grid));

        if let Some(bc) = param.bc(&self.keyword) {
            apply_boundary_conditions(&mut matrix, grid, bc, weight)?;
        }

        debug!(
            "Assembled RT0-P0 matrix on {}D grid with {} cells: {} unknowns, {} non-zeros, weight {}",
            grid.dim(),
            grid.num_cells(),
            matrix.nrows(),
            matrix.nnz(),
            weight
        );
        Ok((matrix, weight))
    }

    /// Assembles the boundary contribution to the right-hand side.
    ///
    /// Sources do not enter the returned vector on grids of positive dimension, see
    /// [`source_rhs`](Self::source_rhs). Fails with [`Rt0Error::InconsistentBoundaryData`] if
    /// only one of boundary conditions and boundary values is given.
    pub fn rhs<T: Real>(&self, grid: &Grid<T>, data: &Data<T>, bc_weight: T) -> Result<DVector<T>, Rt0Error> {
        let param = &data.param;
        if grid.dim() == 0 {
            let source = param.source(&self.keyword);
            check_len("source cells", 1, source.len())?;
            return Ok(DVector::from_column_slice(&[T::zero(), source[0]]));
        }

        match (param.bc(&self.keyword), param.bc_values(&self.keyword)) {
            (Some(bc), Some(bc_values)) => boundary_rhs(grid, bc, bc_values, bc_weight),
            (None, None) => Ok(DVector::zeros(grid.num_faces() + grid.num_cells())),
            _ => Err(Rt0Error::InconsistentBoundaryData),
        }
    }

    /// Assembles the matrix and a right-hand side weighted consistently with it.
    pub fn matrix_rhs<T: Real>(&self, grid: &Grid<T>, data: &Data<T>) -> Result<(CsrMatrix<T>, DVector<T>), Rt0Error> {
        let (matrix, weight) = self.matrix(grid, data, true)?;
        let rhs = self.rhs(grid, data, weight)?;
        Ok((matrix, rhs))
    }

    /// The source term as a right-hand side: `-source` on the cell rows, zero on the face rows.
    ///
    /// A positive source injects fluid into the cell.
    pub fn source_rhs<T: Real>(&self, grid: &Grid<T>, data: &Data<T>) -> Result<DVector<T>, Rt0Error> {
        let source = data.param.source(&self.keyword);
        check_len("source cells", grid.num_cells(), source.len())?;
        let mut rhs = DVector::zeros(grid.num_faces() + grid.num_cells());
        rhs.rows_mut(grid.num_faces(), grid.num_cells())
            .copy_from(&(-&*source));
        Ok(rhs)
    }

    /// The face fluxes of a solution vector.
    ///
    /// # Panics
    ///
    /// Panics if the solution has fewer than `num_faces` entries.
    pub fn extract_flux<'a, T: Real>(&self, grid: &Grid<T>, solution: &'a DVector<T>) -> DVectorView<'a, T> {
        solution.rows(0, grid.num_faces())
    }

    /// The cell pressures of a solution vector.
    ///
    /// # Panics
    ///
    /// Panics if the solution has fewer than `num_faces` entries.
    pub fn extract_scalar<'a, T: Real>(&self, grid: &Grid<T>, solution: &'a DVector<T>) -> DVectorView<'a, T> {
        let num_faces = grid.num_faces();
        solution.rows(num_faces, solution.len() - num_faces)
    }

    /// Reconstructs the velocity at the center of each cell from the face fluxes.
    ///
    /// Returns a `3 x num_cells` matrix in global coordinates.
    pub fn project_flux<T: Real>(
        &self,
        grid: &Grid<T>,
        flux: &DVector<T>,
        data: &Data<T>,
    ) -> Result<Matrix3xX<T>, Rt0Error> {
        if grid.dim() == 0 {
            return Ok(Matrix3xX::zeros(grid.num_cells()));
        }
        let mapping = map_grid(grid)?;
        postprocess::project_flux(grid, &mapping, flux, data.param.aperture().as_slice())
    }
}
