//! Physical parameters and boundary conditions consumed by the discretizer.
use crate::error::check_len;
use crate::Rt0Error;
use mixdim_geometry::{Grid, Real};
use nalgebra::{DMatrix, DVector, Matrix3, Scalar};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// A second-order tensor per cell, such as the permeability.
///
/// Tensors are stored as dense square matrices of equal size, usually `3 x 3`. The frame
/// transformations return new tensors and never modify `self`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondOrderTensor<T: Scalar> {
    values: Vec<DMatrix<T>>,
}

impl<T: Real> SecondOrderTensor<T> {
    /// Isotropic `3 x 3` tensors `k I`, one per entry of `k`.
    pub fn isotropic(k: &[T]) -> Self {
        Self {
            values: k
                .iter()
                .map(|&k| DMatrix::from_diagonal_element(3, 3, k))
                .collect(),
        }
    }

    /// Diagonal `3 x 3` tensors with the given principal values per cell.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths.
    pub fn diagonal(kxx: &[T], kyy: &[T], kzz: &[T]) -> Self {
        assert_eq!(kxx.len(), kyy.len(), "All principal values must be given for every cell.");
        assert_eq!(kxx.len(), kzz.len(), "All principal values must be given for every cell.");
        let values = kxx
            .iter()
            .zip(kyy)
            .zip(kzz)
            .map(|((&kxx, &kyy), &kzz)| DMatrix::from_diagonal(&DVector::from_column_slice(&[kxx, kyy, kzz])))
            .collect();
        Self { values }
    }

    /// Creates tensors from explicit matrices, which must be square and of equal size.
    pub fn from_matrices(values: Vec<DMatrix<T>>) -> Result<Self, Rt0Error> {
        let dim = values.first().map(|k| k.nrows()).unwrap_or(0);
        for k in &values {
            check_len("tensor rows", dim, k.nrows())?;
            check_len("tensor columns", dim, k.ncols())?;
        }
        Ok(Self { values })
    }

    pub fn num_cells(&self) -> usize {
        self.values.len()
    }

    /// The number of rows (and columns) of each tensor.
    pub fn dim(&self) -> usize {
        self.values.first().map(|k| k.nrows()).unwrap_or(0)
    }

    pub fn cell_tensor(&self, cell: usize) -> &DMatrix<T> {
        &self.values[cell]
    }

    /// Computes `R K Rᵀ` for every cell tensor `K`.
    ///
    /// Requires `3 x 3` tensors.
    pub fn rotated(&self, rotation: &Matrix3<T>) -> Result<Self, Rt0Error> {
        if self.num_cells() > 0 {
            check_len("rotated tensor dimension", 3, self.dim())?;
        }
        let r = DMatrix::from_column_slice(3, 3, rotation.as_slice());
        let values = self
            .values
            .iter()
            .map(|k| &r * k * r.transpose())
            .collect();
        Ok(Self { values })
    }

    /// Keeps only the rows and columns of the active axes.
    ///
    /// Requires `3 x 3` tensors.
    pub fn restricted(&self, active_dims: &[bool; 3]) -> Result<Self, Rt0Error> {
        if self.num_cells() > 0 {
            check_len("restricted tensor dimension", 3, self.dim())?;
        }
        let axes: Vec<usize> = (0..3).filter(|&axis| active_dims[axis]).collect();
        let values = self
            .values
            .iter()
            .map(|k| k.select_rows(&axes).select_columns(&axes))
            .collect();
        Ok(Self { values })
    }
}

/// A single boundary condition kind.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum BcKind<T> {
    Dirichlet,
    Neumann,
    Robin { weight: T },
}

/// Boundary condition descriptor with one entry per face of a grid.
///
/// At most one of Dirichlet, Neumann and Robin is set on each face. Faces flagged as internal
/// (faces on a fracture) are treated as homogeneous Dirichlet faces by the discretizer,
/// regardless of their other flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition<T> {
    is_dir: Vec<bool>,
    is_neu: Vec<bool>,
    is_rob: Vec<bool>,
    is_internal: Vec<bool>,
    robin_weight: Vec<T>,
}

impl<T: Real> BoundaryCondition<T> {
    /// Neumann conditions on every boundary face of the grid.
    ///
    /// The given faces are additionally flagged as internal.
    ///
    /// # Panics
    ///
    /// Panics if an internal face index is out of bounds.
    pub fn new(grid: &Grid<T>, internal_faces: &[usize]) -> Self {
        let num_faces = grid.num_faces();
        let mut is_neu = vec![false; num_faces];
        for face in grid.boundary_faces() {
            is_neu[face] = true;
        }
        let mut is_internal = vec![false; num_faces];
        for &face in internal_faces {
            is_internal[face] = true;
        }
        Self {
            is_dir: vec![false; num_faces],
            is_neu,
            is_rob: vec![false; num_faces],
            is_internal,
            robin_weight: vec![T::one(); num_faces],
        }
    }

    /// Builds a descriptor from raw per-face flags.
    pub fn from_flags(
        is_dir: Vec<bool>,
        is_neu: Vec<bool>,
        is_rob: Vec<bool>,
        is_internal: Vec<bool>,
        robin_weight: Vec<T>,
    ) -> Result<Self, Rt0Error> {
        let num_faces = is_dir.len();
        check_len("Neumann flags", num_faces, is_neu.len())?;
        check_len("Robin flags", num_faces, is_rob.len())?;
        check_len("internal flags", num_faces, is_internal.len())?;
        check_len("Robin weights", num_faces, robin_weight.len())?;
        for face in 0..num_faces {
            let num_kinds = [is_dir[face], is_neu[face], is_rob[face]]
                .iter()
                .filter(|&&flag| flag)
                .count();
            if num_kinds > 1 {
                return Err(Rt0Error::ConflictingBoundaryCondition { face });
            }
        }
        Ok(Self {
            is_dir,
            is_neu,
            is_rob,
            is_internal,
            robin_weight,
        })
    }

    /// Assigns a boundary condition kind to a face, replacing any previous kind.
    pub fn set(&mut self, face: usize, kind: BcKind<T>) {
        self.is_dir[face] = kind == BcKind::Dirichlet;
        self.is_neu[face] = kind == BcKind::Neumann;
        self.is_rob[face] = false;
        if let BcKind::Robin { weight } = kind {
            self.is_rob[face] = true;
            self.robin_weight[face] = weight;
        }
    }

    /// Builder-style variant of [`set`](Self::set) for several faces.
    pub fn with_kind(mut self, faces: impl IntoIterator<Item = usize>, kind: BcKind<T>) -> Self {
        for face in faces {
            self.set(face, kind);
        }
        self
    }

    pub fn kind(&self, face: usize) -> Option<BcKind<T>> {
        if self.is_dir[face] {
            Some(BcKind::Dirichlet)
        } else if self.is_neu[face] {
            Some(BcKind::Neumann)
        } else if self.is_rob[face] {
            Some(BcKind::Robin {
                weight: self.robin_weight[face],
            })
        } else {
            None
        }
    }
}

impl<T> BoundaryCondition<T> {
    pub fn num_faces(&self) -> usize {
        self.is_dir.len()
    }

    pub fn is_dir(&self) -> &[bool] {
        &self.is_dir
    }

    pub fn is_neu(&self) -> &[bool] {
        &self.is_neu
    }

    pub fn is_rob(&self) -> &[bool] {
        &self.is_rob
    }

    pub fn is_internal(&self) -> &[bool] {
        &self.is_internal
    }

    pub fn robin_weight(&self) -> &[T] {
        &self.robin_weight
    }

    /// Faces with a Dirichlet condition that are not internal.
    pub fn dirichlet_faces(&self) -> Vec<usize> {
        self.external_faces(&self.is_dir)
    }

    /// Faces with a Neumann condition that are not internal.
    pub fn neumann_faces(&self) -> Vec<usize> {
        self.external_faces(&self.is_neu)
    }

    /// Faces with a Robin condition that are not internal.
    pub fn robin_faces(&self) -> Vec<usize> {
        self.external_faces(&self.is_rob)
    }

    fn external_faces(&self, flags: &[bool]) -> Vec<usize> {
        flags
            .iter()
            .zip(&self.is_internal)
            .enumerate()
            .filter(|(_, (&flag, &internal))| flag && !internal)
            .map(|(face, _)| face)
            .collect()
    }
}

/// Parameters of a single grid, keyed by the keyword of the physical process they belong to.
///
/// The aperture is shared by all processes.
#[derive(Debug, Clone)]
pub struct Parameters<T: Scalar> {
    num_cells: usize,
    tensors: FxHashMap<String, SecondOrderTensor<T>>,
    bcs: FxHashMap<String, BoundaryCondition<T>>,
    bc_values: FxHashMap<String, DVector<T>>,
    sources: FxHashMap<String, DVector<T>>,
    aperture: Option<DVector<T>>,
}

impl<T: Real> Parameters<T> {
    /// Empty parameters for a grid with the given number of cells.
    pub fn new(num_cells: usize) -> Self {
        Self {
            num_cells,
            tensors: FxHashMap::default(),
            bcs: FxHashMap::default(),
            bc_values: FxHashMap::default(),
            sources: FxHashMap::default(),
            aperture: None,
        }
    }

    pub fn for_grid(grid: &Grid<T>) -> Self {
        Self::new(grid.num_cells())
    }

    pub fn with_tensor(mut self, keyword: impl Into<String>, tensor: SecondOrderTensor<T>) -> Self {
        self.tensors.insert(keyword.into(), tensor);
        self
    }

    pub fn with_bc(mut self, keyword: impl Into<String>, bc: BoundaryCondition<T>) -> Self {
        self.bcs.insert(keyword.into(), bc);
        self
    }

    pub fn with_bc_values(mut self, keyword: impl Into<String>, values: DVector<T>) -> Self {
        self.bc_values.insert(keyword.into(), values);
        self
    }

    pub fn with_source(mut self, keyword: impl Into<String>, source: DVector<T>) -> Self {
        self.sources.insert(keyword.into(), source);
        self
    }

    pub fn with_aperture(mut self, aperture: DVector<T>) -> Self {
        self.aperture = Some(aperture);
        self
    }

    pub fn num_cells(&self) -> usize {
        self.num_cells
    }

    /// The tensor of the given process, or the unit isotropic tensor if none is set.
    pub fn tensor(&self, keyword: &str) -> Cow<'_, SecondOrderTensor<T>> {
        match self.tensors.get(keyword) {
            Some(tensor) => Cow::Borrowed(tensor),
            None => Cow::Owned(SecondOrderTensor::isotropic(&vec![T::one(); self.num_cells])),
        }
    }

    pub fn bc(&self, keyword: &str) -> Option<&BoundaryCondition<T>> {
        self.bcs.get(keyword)
    }

    pub fn bc_values(&self, keyword: &str) -> Option<&DVector<T>> {
        self.bc_values.get(keyword)
    }

    /// The source of the given process, or zero in every cell if none is set.
    pub fn source(&self, keyword: &str) -> Cow<'_, DVector<T>> {
        match self.sources.get(keyword) {
            Some(source) => Cow::Borrowed(source),
            None => Cow::Owned(DVector::zeros(self.num_cells)),
        }
    }

    /// The aperture of each cell, or one in every cell if none is set.
    pub fn aperture(&self) -> Cow<'_, DVector<T>> {
        match &self.aperture {
            Some(aperture) => Cow::Borrowed(aperture),
            None => Cow::Owned(DVector::repeat(self.num_cells, T::one())),
        }
    }
}

/// The data context of a grid passed to the discretizer.
#[derive(Debug, Clone)]
pub struct Data<T: Scalar> {
    pub param: Parameters<T>,
    /// Whether the tensors are already expressed in the local frame of the grid.
    pub is_tangential: bool,
}

impl<T: Real> Data<T> {
    pub fn new(param: Parameters<T>) -> Self {
        Self {
            param,
            is_tangential: false,
        }
    }

    pub fn tangential(param: Parameters<T>) -> Self {
        Self {
            param,
            is_tangential: true,
        }
    }
}
