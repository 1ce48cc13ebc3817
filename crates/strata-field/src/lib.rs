//! Grid property storage for Strata.
//!
//! A [`Field`] holds the values of one 3D grid property (porosity,
//! permeability, pressure, ...) for one ensemble member, packed over the
//! active cells of the grid described by its shared [`FieldConfig`].
//! This crate moves those values between memory and the file formats
//! reservoir tools exchange:
//!
//! - the native compressed record used for ensemble storage ([`native`])
//! - binary restart keywords, active cells or full volume ([`ecl_kw`])
//! - GRDECL include files ([`grdecl`])
//! - ROFF binary tag streams ([`roff`])
//!
//! Reordering between the packed active-cell layout and a dense full-grid
//! array lives in [`remap`]. Named numeric transforms applied at load and
//! export time live in [`transform`].
//!
//! # Export
//!
//! ```text
//! Field ──(output transform + truncation on a snapshot)──> remap ──> codec ──> file
//! ```
//!
//! The canonical values are never modified by an export.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod ecl_kw;
pub mod error;
pub mod field;
pub mod format;
pub mod grdecl;
pub mod native;
pub mod remap;
pub mod roff;
pub mod transform;

pub use config::{FieldConfig, FieldConfigBuilder, FieldVarType};
pub use error::{FieldError, UserKeyError};
pub use field::{ExportTarget, Field};
pub use format::{ExportFormat, ImportFormat};
pub use transform::{FieldTransform, TransformTable};

/// Fill value ROFF uses for inactive cells, for every element type.
pub const ROFF_INACTIVE: f64 = -999.0;
