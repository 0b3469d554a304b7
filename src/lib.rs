//! Lowest-order Raviart-Thomas (RT0-P0) mixed finite elements for Darcy flow on grids of
//! dimension 0 to 3, as used for the individual subdomains of fractured media.
pub mod assembly;
pub mod dof;
pub mod error;
pub mod io;
pub mod params;
pub mod postprocess;
pub mod rt0;

pub mod geometry {
    pub use mixdim_geometry::*;
}

pub mod sparse {
    pub use mixdim_sparse::*;
}

#[cfg(feature = "proptest")]
pub mod proptest;

pub use dof::{DofEntity, EntityKind};
pub use error::Rt0Error;
pub use mixdim_geometry::Real;
pub use params::{BcKind, BoundaryCondition, Data, Parameters, SecondOrderTensor};
pub use rt0::Rt0;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;
pub extern crate vtkio;
