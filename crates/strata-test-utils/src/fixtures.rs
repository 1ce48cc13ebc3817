//! Reusable grids, field configurations and field values.
//!
//! - [`holey_grid`]: 4x3x2 grid with three inactive cells.
//! - [`field_config`]: a PARAMETER field on that grid.
//! - [`ramp`]: a field whose k-th active value is `0.5 * (k + 1)`.

use std::sync::Arc;

use strata_core::ElementType;
use strata_field::{Field, FieldConfig};
use strata_grid::ActnumGrid;

/// Cells left inactive by [`holey_grid`].
pub const INACTIVE_CELLS: [(usize, usize, usize); 3] = [(1, 1, 0), (3, 2, 1), (0, 0, 1)];

/// A 4x3x2 grid with the cells of [`INACTIVE_CELLS`] switched off: 24 cells,
/// 21 active.
pub fn holey_grid() -> Arc<ActnumGrid> {
    let grid = ActnumGrid::all_active(4, 3, 2)
        .expect("4x3x2 is a valid grid")
        .with_inactive(&INACTIVE_CELLS);
    Arc::new(grid)
}

/// A PARAMETER field `key` of `element_type` on [`holey_grid`].
pub fn field_config(key: &str, element_type: ElementType) -> Arc<FieldConfig> {
    FieldConfig::builder(key, holey_grid())
        .element_type(element_type)
        .build()
}

/// A field of `config` filled with `0.5 * (k + 1)` at storage index `k`.
pub fn ramp(config: &Arc<FieldConfig>) -> Field<'static> {
    let mut field = Field::new(Arc::clone(config));
    let mut data = field.data_mut();
    for k in 0..data.len() {
        data.set_f64(k, 0.5 * (k + 1) as f64);
    }
    field
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_grid::GridGeometry;

    #[test]
    fn holey_grid_counts() {
        let grid = holey_grid();
        assert_eq!(grid.dims().volume(), 24);
        assert_eq!(grid.active_count(), 21);
    }

    #[test]
    fn ramp_values() {
        let config = field_config("PORO", ElementType::Double);
        let field = ramp(&config);
        assert_eq!(field.iget_f64(0), Some(0.5));
        assert_eq!(field.iget_f64(20), Some(10.5));
        assert_eq!(field.iget_f64(21), None);
    }
}
