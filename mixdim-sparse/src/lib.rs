//! Functionality for sparse linear algebra.
//!
//! Small building blocks on top of `nalgebra-sparse` that the saddle-point assemblers need:
//! assembly from triplets with an explicitly stored diagonal, block composition, and the
//! row and diagonal manipulations used when imposing boundary conditions.

use nalgebra::{ClosedAdd, RealField, Scalar};
use nalgebra_sparse::{CooMatrix, CsrMatrix, SparseEntryMut};
use num::Zero;
use std::error::Error;
use std::fmt;

pub use nalgebra_sparse;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SparseError {
    /// The diagonal entry of the given row is not part of the sparsity pattern.
    MissingDiagonalEntry { row: usize },
}

impl fmt::Display for SparseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDiagonalEntry { row } => {
                write!(f, "Diagonal entry of row {} is not stored in the sparsity pattern", row)
            }
        }
    }
}

impl Error for SparseError {}

/// Assembles a square CSR matrix from triplets.
///
/// Duplicate triplets are summed. Every diagonal entry is stored explicitly (as an explicit zero
/// if no triplet touches it), so that row manipulations can rely on the diagonal being present.
///
/// # Panics
///
/// Panics if any triplet is out of bounds.
pub fn csr_from_triplets_with_diagonal<T>(n: usize, triplets: impl IntoIterator<Item = (usize, usize, T)>) -> CsrMatrix<T>
where
    T: Scalar + Zero + ClosedAdd,
{
    let mut coo = CooMatrix::new(n, n);
    for i in 0..n {
        coo.push(i, i, T::zero());
    }
    for (i, j, v) in triplets {
        coo.push(i, j, v);
    }
    CsrMatrix::from(&coo)
}

/// Creates a square CSR matrix with the given diagonal.
///
/// Zeros in `diagonal` are stored explicitly.
pub fn csr_from_diagonal<T>(diagonal: &[T]) -> CsrMatrix<T>
where
    T: Scalar,
{
    let n = diagonal.len();
    let offsets = (0..=n).collect();
    let col_indices = (0..n).collect();
    CsrMatrix::try_from_csr_data(n, n, offsets, col_indices, diagonal.to_vec())
        .expect("Internal error: a diagonal matrix must always be a valid CSR matrix.")
}

/// Builds the saddle-point block matrix `[[a, bᵀ], [b, 0]]`.
///
/// `a` must be square (`n x n`) and `b` must be `m x n`. The diagonal of the result is stored
/// explicitly, including the diagonal of the zero block.
///
/// # Panics
///
/// Panics if the block dimensions are incompatible.
pub fn saddle_point_matrix<T>(a: &CsrMatrix<T>, b: &CsrMatrix<T>) -> CsrMatrix<T>
where
    T: Scalar + Zero + ClosedAdd,
{
    let n = a.nrows();
    assert_eq!(a.ncols(), n, "Upper-left block must be square.");
    assert_eq!(b.ncols(), n, "Lower-left block must have as many columns as the upper-left block.");

    let a_entries = a.triplet_iter().map(|(i, j, v)| (i, j, v.clone()));
    let b_entries = b
        .triplet_iter()
        .flat_map(|(i, j, v)| [(n + i, j, v.clone()), (j, n + i, v.clone())]);
    csr_from_triplets_with_diagonal(n + b.nrows(), a_entries.chain(b_entries))
}

/// Zeros every stored entry of `row` and sets its diagonal entry to `diagonal`.
///
/// # Panics
///
/// Panics if `row` is out of bounds.
pub fn clear_row_and_set_diagonal<T>(matrix: &mut CsrMatrix<T>, row: usize, diagonal: T) -> Result<(), SparseError>
where
    T: Scalar + Zero,
{
    let mut csr_row = matrix.row_mut(row);
    let (cols, values) = csr_row.cols_and_values_mut();
    let mut found_diagonal = false;
    for (&col, value) in cols.iter().zip(values.iter_mut()) {
        if col == row {
            *value = diagonal.clone();
            found_diagonal = true;
        } else {
            *value = T::zero();
        }
    }

    if found_diagonal {
        Ok(())
    } else {
        Err(SparseError::MissingDiagonalEntry { row })
    }
}

/// Adds each `(row, value)` pair to the corresponding diagonal entry.
pub fn add_to_diagonal<T>(
    matrix: &mut CsrMatrix<T>,
    entries: impl IntoIterator<Item = (usize, T)>,
) -> Result<(), SparseError>
where
    T: Scalar + ClosedAdd,
{
    for (row, value) in entries {
        match matrix.get_entry_mut(row, row) {
            Some(SparseEntryMut::NonZero(entry)) => *entry += value,
            _ => return Err(SparseError::MissingDiagonalEntry { row }),
        }
    }
    Ok(())
}

/// The infinity norm (maximum absolute row sum) of a sparse matrix.
pub fn infinity_norm<T>(matrix: &CsrMatrix<T>) -> T
where
    T: RealField,
{
    matrix
        .row_iter()
        .map(|row| {
            row.values()
                .iter()
                .fold(T::zero(), |sum, v| sum + v.clone().abs())
        })
        .fold(T::zero(), |max, row_sum| max.max(row_sum))
}
