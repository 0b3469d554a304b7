//! Errors raised by the RT0 discretizer.
use mixdim_geometry::MappingError;
use mixdim_sparse::SparseError;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Rt0Error {
    /// Degrees of freedom were requested for an entity that is neither a grid nor a mortar grid.
    InvalidEntityKind { kind: String },
    /// Exactly one of the boundary condition descriptor and the boundary values is present.
    InconsistentBoundaryData,
    /// The cell containing `face` is not a simplex. Either the face does not miss exactly one node
    /// of the cell, or the cell has the wrong number of faces or nodes for its dimension.
    NonSimplicialCell { face: usize, num_candidates: usize },
    SingularPermeability { cell: usize },
    /// A boundary condition descriptor assigns more than one kind to a face.
    ConflictingBoundaryCondition { face: usize },
    Mapping(MappingError),
    Sparse(SparseError),
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for Rt0Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEntityKind { kind } => write!(f, "Cannot count degrees of freedom of entity {}", kind),
            Self::InconsistentBoundaryData => {
                write!(f, "Boundary conditions and boundary values must be given together")
            }
            Self::NonSimplicialCell { face, num_candidates } => write!(
                f,
                "Cell with face {} is not a simplex ({} nodes opposite to the face)",
                face, num_candidates
            ),
            Self::SingularPermeability { cell } => write!(f, "Permeability of cell {} is singular", cell),
            Self::ConflictingBoundaryCondition { face } => {
                write!(f, "Face {} is assigned more than one boundary condition", face)
            }
            Self::Mapping(err) => write!(f, "Failed to map grid to reference frame: {}", err),
            Self::Sparse(err) => write!(f, "Sparse matrix error: {}", err),
            Self::DimensionMismatch { what, expected, actual } => {
                write!(f, "Dimension mismatch for {}: expected {}, got {}", what, expected, actual)
            }
        }
    }
}

impl Error for Rt0Error {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Mapping(err) => Some(err),
            Self::Sparse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<MappingError> for Rt0Error {
    fn from(err: MappingError) -> Self {
        Self::Mapping(err)
    }
}

impl From<SparseError> for Rt0Error {
    fn from(err: SparseError) -> Self {
        Self::Sparse(err)
    }
}

/// Checks that a per-entity array has the expected length.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<(), Rt0Error> {
    if expected == actual {
        Ok(())
    } else {
        Err(Rt0Error::DimensionMismatch { what, expected, actual })
    }
}
