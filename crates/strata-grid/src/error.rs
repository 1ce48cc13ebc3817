//! Error types for grid construction.

use thiserror::Error;

/// Errors arising from grid construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GridError {
    /// A grid must have at least one cell along every axis.
    #[error("grid dimensions must be non-zero, got {nx}x{ny}x{nz}")]
    EmptyGrid {
        /// Cells along I.
        nx: usize,
        /// Cells along J.
        ny: usize,
        /// Cells along K.
        nz: usize,
    },
    /// The ACTNUM array does not cover the grid volume.
    #[error("ACTNUM has {found} entries, grid volume is {expected}")]
    ActnumLength {
        /// Grid volume.
        expected: usize,
        /// Length of the supplied ACTNUM array.
        found: usize,
    },
}
