//! An ACTNUM-backed [`GridGeometry`] implementation.

use crate::error::GridError;
use crate::geometry::{Dims, GridGeometry};

const INACTIVE: u32 = u32::MAX;

/// Grid whose active cells are given by an ACTNUM array in natural order.
///
/// Active indices are assigned in natural order, so the packed layout of a
/// field matches what a simulator writes for the same ACTNUM.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActnumGrid {
    name: String,
    dims: Dims,
    active_index: Vec<u32>,
    active_count: usize,
}

impl ActnumGrid {
    /// Build from an ACTNUM array (`0` = inactive, anything else active).
    pub fn new(nx: usize, ny: usize, nz: usize, actnum: &[i32]) -> Result<Self, GridError> {
        if nx == 0 || ny == 0 || nz == 0 {
            return Err(GridError::EmptyGrid { nx, ny, nz });
        }
        let dims = Dims::new(nx, ny, nz);
        if actnum.len() != dims.volume() {
            return Err(GridError::ActnumLength {
                expected: dims.volume(),
                found: actnum.len(),
            });
        }
        let mut next = 0u32;
        let active_index = actnum
            .iter()
            .map(|&a| {
                if a != 0 {
                    next += 1;
                    next - 1
                } else {
                    INACTIVE
                }
            })
            .collect();
        Ok(Self {
            name: "GRID".to_string(),
            dims,
            active_index,
            active_count: next as usize,
        })
    }

    /// A grid with every cell active.
    pub fn all_active(nx: usize, ny: usize, nz: usize) -> Result<Self, GridError> {
        Self::new(nx, ny, nz, &vec![1; nx * ny * nz])
    }

    /// Set the name used in diagnostics.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Deactivate the given cells. Coordinates outside the grid are ignored.
    pub fn with_inactive(self, cells: &[(usize, usize, usize)]) -> Self {
        let dims = self.dims;
        let mut actnum: Vec<i32> = self
            .active_index
            .iter()
            .map(|&a| i32::from(a != INACTIVE))
            .collect();
        for &(i, j, k) in cells {
            if dims.contains(i, j, k) {
                actnum[dims.global_index(i, j, k)] = 0;
            }
        }
        let mut next = 0u32;
        let active_index = actnum
            .iter()
            .map(|&a| {
                if a != 0 {
                    next += 1;
                    next - 1
                } else {
                    INACTIVE
                }
            })
            .collect();
        Self {
            name: self.name,
            dims,
            active_index,
            active_count: next as usize,
        }
    }
}

impl GridGeometry for ActnumGrid {
    fn dims(&self) -> Dims {
        self.dims
    }

    fn active_index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        match self.active_index[self.dims.global_index(i, j, k)] {
            INACTIVE => None,
            a => Some(a as usize),
        }
    }

    fn active_count(&self) -> usize {
        self.active_count
    }

    fn name(&self) -> &str {
        &self.name
    }
}
