//! The [`GridGeometry`] trait.

use std::fmt;

/// Grid dimensions `(nx, ny, nz)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Dims {
    /// Cells along I.
    pub nx: usize,
    /// Cells along J.
    pub ny: usize,
    /// Cells along K.
    pub nz: usize,
}

impl Dims {
    /// Shorthand constructor.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self {
        Self { nx, ny, nz }
    }

    /// Total number of cells, active or not.
    pub fn volume(&self) -> usize {
        self.nx * self.ny * self.nz
    }

    /// Whether `(i, j, k)` lies inside the grid.
    pub fn contains(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.nx && j < self.ny && k < self.nz
    }

    /// Natural (I fastest) global index of `(i, j, k)`.
    pub fn global_index(&self, i: usize, j: usize, k: usize) -> usize {
        i + j * self.nx + k * self.nx * self.ny
    }

    /// Inverse of [`global_index`](Self::global_index).
    pub fn ijk(&self, global: usize) -> (usize, usize, usize) {
        let layer = self.nx * self.ny;
        let k = global / layer;
        let rem = global % layer;
        (rem % self.nx, rem / self.nx, k)
    }
}

impl fmt::Display for Dims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.nx, self.ny, self.nz)
    }
}

/// Active-cell lookup for a corner-point or Cartesian reservoir grid.
///
/// Implementations are immutable and shared between every field
/// configuration defined on the grid, hence `Send + Sync`.
pub trait GridGeometry: Send + Sync + fmt::Debug {
    /// Grid dimensions.
    fn dims(&self) -> Dims;

    /// Packed active index of `(i, j, k)`, or `None` for an inactive cell.
    ///
    /// Callers guarantee the coordinate is in bounds.
    fn active_index(&self, i: usize, j: usize, k: usize) -> Option<usize>;

    /// Number of active cells.
    fn active_count(&self) -> usize;

    /// Total number of cells.
    fn volume(&self) -> usize {
        self.dims().volume()
    }

    /// Natural global index of `(i, j, k)`.
    fn global_index(&self, i: usize, j: usize, k: usize) -> usize {
        self.dims().global_index(i, j, k)
    }

    /// Whether `(i, j, k)` is an active cell.
    fn is_active(&self, i: usize, j: usize, k: usize) -> bool {
        self.active_index(i, j, k).is_some()
    }

    /// Human-readable grid name, used in diagnostics.
    fn name(&self) -> &str {
        "GRID"
    }
}
