//! Counting of unknowns on grids and interfaces.
use crate::Rt0Error;
use mixdim_geometry::{Grid, MortarGrid};
use nalgebra::Scalar;

/// The kind of entity that unknowns can be attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// A grid carrying one flux per face followed by one pressure per cell.
    FullGrid { num_faces: usize, num_cells: usize },
    /// An interface carrying one flux per mortar cell.
    MortarGrid { num_cells: usize },
    /// Anything else. The name is used for error reporting.
    Unsupported { name: String },
}

impl EntityKind {
    pub fn ndof(&self) -> Result<usize, Rt0Error> {
        match self {
            Self::FullGrid { num_faces, num_cells } => Ok(num_faces + num_cells),
            Self::MortarGrid { num_cells } => Ok(*num_cells),
            Self::Unsupported { name } => Err(Rt0Error::InvalidEntityKind { kind: name.clone() }),
        }
    }
}

/// Entities that a coupling framework may ask the discretizer to count unknowns on.
pub trait DofEntity {
    fn entity_kind(&self) -> EntityKind;
}

impl<T: Scalar> DofEntity for Grid<T> {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::FullGrid {
            num_faces: self.num_faces(),
            num_cells: self.num_cells(),
        }
    }
}

impl DofEntity for MortarGrid {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::MortarGrid {
            num_cells: self.num_cells(),
        }
    }
}
