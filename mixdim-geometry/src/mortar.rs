//! Interface grids coupling a grid to a lower-dimensional neighbour.

/// A mortar grid living on the interface between a grid and a grid of one dimension lower.
///
/// The interface may have one or two sides (e.g. the two faces of a fracture); each side carries
/// its own cells. Only the cell layout is represented here, since unknowns on the interface are
/// one flux per mortar cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MortarGrid {
    dim: usize,
    side_num_cells: Vec<usize>,
}

impl MortarGrid {
    /// Creates a mortar grid with the given number of cells on each side.
    pub fn new(dim: usize, side_num_cells: Vec<usize>) -> Self {
        Self { dim, side_num_cells }
    }

    /// A two-sided mortar grid matching the cells of a lower-dimensional grid on both sides.
    pub fn two_sided(dim: usize, num_cells_per_side: usize) -> Self {
        Self::new(dim, vec![num_cells_per_side; 2])
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn num_sides(&self) -> usize {
        self.side_num_cells.len()
    }

    pub fn side_num_cells(&self) -> &[usize] {
        &self.side_num_cells
    }

    pub fn num_cells(&self) -> usize {
        self.side_num_cells.iter().sum()
    }
}
