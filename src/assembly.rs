//! Local and global assembly of the RT0-P0 saddle-point system.
pub mod global;
pub mod local;
