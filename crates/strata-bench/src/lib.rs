//! Benchmark profiles and utilities for the Strata ensemble parameter store.
//!
//! Provides pre-built grids and fields for benchmarking:
//!
//! - [`reference_grid`]: 100x100x20 grid (200K cells), ~10% inactive
//! - [`stress_grid`]: 200x200x50 grid (2M cells) for stress testing
//! - [`ramp_field`]: a field with deterministic, distinct values

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::Arc;

use strata_core::ElementType;
use strata_field::{Field, FieldConfig};
use strata_grid::ActnumGrid;

/// Build the reference benchmark grid: 100x100x20 (200K cells).
pub fn reference_grid(seed: u64) -> Arc<ActnumGrid> {
    Arc::new(holey_grid(100, 100, 20, seed))
}

/// Build the stress benchmark grid: 200x200x50 (2M cells).
///
/// Same inactive fraction as [`reference_grid`] at 10x the cell count.
pub fn stress_grid(seed: u64) -> Arc<ActnumGrid> {
    Arc::new(holey_grid(200, 200, 50, seed))
}

/// Deterministic ACTNUM with roughly one cell in ten inactive.
///
/// Uses a simple multiplicative hash of the seed and the global index.
pub fn actnum(volume: usize, seed: u64) -> Vec<i32> {
    (0..volume as u64)
        .map(|g| {
            let h = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(g.wrapping_mul(1442695040888963407));
            i32::from((h >> 33) % 10 != 0)
        })
        .collect()
}

fn holey_grid(nx: usize, ny: usize, nz: usize, seed: u64) -> ActnumGrid {
    let actnum = actnum(nx * ny * nz, seed);
    ActnumGrid::new(nx, ny, nz, &actnum).unwrap()
}

/// A PARAMETER field on `grid` with value `k` at storage index `k`.
pub fn ramp_field(grid: Arc<ActnumGrid>, element_type: ElementType) -> Field<'static> {
    let config = FieldConfig::builder("PORO", grid)
        .element_type(element_type)
        .build();
    let mut field = Field::new(config);
    let mut data = field.data_mut();
    for k in 0..data.len() {
        data.set_f64(k, k as f64);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_grid::GridGeometry;

    #[test]
    fn reference_grid_has_inactive_cells() {
        let grid = reference_grid(42);
        let volume = grid.volume();
        assert_eq!(volume, 200_000);
        let active = grid.active_count();
        assert!(active < volume);
        assert!(active > volume * 8 / 10, "{active} of {volume} active");
    }

    #[test]
    fn actnum_deterministic() {
        assert_eq!(actnum(1000, 7), actnum(1000, 7));
        assert_ne!(actnum(1000, 7), actnum(1000, 8));
    }

    #[test]
    fn ramp_field_matches_active_count() {
        let grid = reference_grid(1);
        let active = grid.active_count();
        let field = ramp_field(grid, ElementType::Float);
        assert_eq!(field.data().len(), active);
        assert_eq!(field.iget_f64(10), Some(10.0));
    }
}
