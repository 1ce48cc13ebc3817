//! Reordering between packed active-cell storage and dense grid arrays.
//!
//! External formats store one value per grid cell in either natural or
//! ROFF order; a [`Field`](crate::Field) stores one value per active cell.
//! [`export_3d`] expands, [`import_3d`] packs. Both convert element types
//! along the way, restricted to the pairs in [`check_export`] and
//! [`check_import`].

use strata_core::{BufferMut, BufferRef, Element, ElementType, TypedBuffer};
use strata_grid::IndexOrder;

use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::ROFF_INACTIVE;

/// Value written to inactive cells that have no init-file value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFill {
    /// Zero of the target type.
    Zero,
    /// The ROFF inactive sentinel (`-999`) of the target type.
    RoffInactive,
}

impl ExportFill {
    fn value<T: Element>(self) -> T {
        match self {
            Self::Zero => T::default(),
            Self::RoffInactive => T::from_f64(ROFF_INACTIVE),
        }
    }
}

/// Verify a field of type `from` may be exported as `to`.
///
/// float64 and float32 fields export to either float type; int32 fields
/// export to any type.
pub fn check_export(from: ElementType, to: ElementType) -> Result<(), FieldError> {
    use ElementType::*;
    match (from, to) {
        (Double | Float, Float | Double) | (Int, _) => Ok(()),
        _ => Err(FieldError::UnsupportedExport { from, to }),
    }
}

/// Verify `from` data may be imported into a field of type `to`.
///
/// Float fields accept any element type; int32 fields accept only int32.
pub fn check_import(from: ElementType, to: ElementType) -> Result<(), FieldError> {
    use ElementType::*;
    match (from, to) {
        (_, Float | Double) | (Int, Int) => Ok(()),
        _ => Err(FieldError::UnsupportedImport { from, to }),
    }
}

/// Expand packed `data` to a full-volume array of `target` type.
///
/// Cells are visited with K outermost. An inactive cell takes its value
/// from `init` (a full-volume array indexed by global index) when given,
/// otherwise `fill`.
pub fn export_3d(
    config: &FieldConfig,
    data: BufferRef<'_>,
    init: Option<BufferRef<'_>>,
    order: IndexOrder,
    target: ElementType,
    fill: ExportFill,
) -> Result<TypedBuffer, FieldError> {
    check_export(data.element_type(), target)?;
    if data.len() != config.data_size() {
        return Err(FieldError::SizeMismatch {
            key: config.key().to_string(),
            expected: config.data_size(),
            found: data.len(),
        });
    }
    if let Some(init) = init {
        if init.element_type() != data.element_type() {
            return Err(FieldError::InitTypeMismatch {
                key: config.key().to_string(),
                expected: data.element_type(),
                found: init.element_type(),
            });
        }
        if init.len() != config.volume() {
            return Err(FieldError::SizeMismatch {
                key: config.key().to_string(),
                expected: config.volume(),
                found: init.len(),
            });
        }
    }
    let mut out = TypedBuffer::zeroed(target, config.volume());
    match data {
        BufferRef::Int(src) => export_from(config, src, init, order, fill, out.view_mut()),
        BufferRef::Float(src) => export_from(config, src, init, order, fill, out.view_mut()),
        BufferRef::Double(src) => export_from(config, src, init, order, fill, out.view_mut()),
    }
    Ok(out)
}

fn export_from<S: Element>(
    config: &FieldConfig,
    src: &[S],
    init: Option<BufferRef<'_>>,
    order: IndexOrder,
    fill: ExportFill,
    out: BufferMut<'_>,
) {
    let init = init.and_then(S::from_ref);
    match out {
        BufferMut::Int(o) => export_typed(config, src, init, order, fill.value(), o),
        BufferMut::Float(o) => export_typed(config, src, init, order, fill.value(), o),
        BufferMut::Double(o) => export_typed(config, src, init, order, fill.value(), o),
    }
}

fn export_typed<S: Element, T: Element>(
    config: &FieldConfig,
    src: &[S],
    init: Option<&[S]>,
    order: IndexOrder,
    fill: T,
    out: &mut [T],
) {
    let dims = config.dims();
    let grid = config.grid();
    for k in 0..dims.nz {
        for j in 0..dims.ny {
            for i in 0..dims.nx {
                let target = order.linear_index(dims, i, j, k);
                let active = grid.is_active(i, j, k);
                out[target] = match (init, active) {
                    (Some(init), false) => init[grid.global_index(i, j, k)].convert(),
                    _ => match config.storage_index(i, j, k) {
                        Some(idx) => src[idx].convert(),
                        None => fill,
                    },
                };
            }
        }
    }
}

/// Pack a full-volume array in `order` into `out`.
///
/// With a configuration that keeps inactive cells every cell is copied to
/// its global index; otherwise inactive cells are skipped and keep their
/// previous value.
pub fn import_3d(
    config: &FieldConfig,
    src: BufferRef<'_>,
    order: IndexOrder,
    out: BufferMut<'_>,
) -> Result<(), FieldError> {
    check_import(src.element_type(), out.element_type())?;
    if src.len() != config.volume() {
        return Err(FieldError::SizeMismatch {
            key: config.key().to_string(),
            expected: config.volume(),
            found: src.len(),
        });
    }
    if out.len() != config.data_size() {
        return Err(FieldError::SizeMismatch {
            key: config.key().to_string(),
            expected: config.data_size(),
            found: out.len(),
        });
    }
    match src {
        BufferRef::Int(s) => import_into(config, s, order, out),
        BufferRef::Float(s) => import_into(config, s, order, out),
        BufferRef::Double(s) => import_into(config, s, order, out),
    }
    Ok(())
}

fn import_into<S: Element>(config: &FieldConfig, src: &[S], order: IndexOrder, out: BufferMut<'_>) {
    match out {
        BufferMut::Int(o) => import_typed(config, src, order, o),
        BufferMut::Float(o) => import_typed(config, src, order, o),
        BufferMut::Double(o) => import_typed(config, src, order, o),
    }
}

fn import_typed<S: Element, T: Element>(
    config: &FieldConfig,
    src: &[S],
    order: IndexOrder,
    out: &mut [T],
) {
    let dims = config.dims();
    for k in 0..dims.nz {
        for j in 0..dims.ny {
            for i in 0..dims.nx {
                if let Some(target) = config.storage_index(i, j, k) {
                    out[target] = src[order.linear_index(dims, i, j, k)].convert();
                }
            }
        }
    }
}
