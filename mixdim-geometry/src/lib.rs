//! Grid topology, geometry and reference-frame mapping for `mixdim`.
use nalgebra::RealField;

pub mod grid;
pub mod map;
pub mod mortar;
pub mod procedural;

pub use grid::{Grid, GridError};
pub use map::{map_grid, GridMapping, MappingError};
pub use mortar::MortarGrid;

pub use nalgebra;
pub use nalgebra_sparse;

pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
