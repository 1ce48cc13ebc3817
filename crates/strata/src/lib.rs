//! Strata: an ensemble parameter store for reservoir history matching.
//!
//! This is the top-level facade crate that re-exports the public API from all
//! Strata sub-crates. For most users, adding `strata` as a single dependency
//! is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use strata::prelude::*;
//!
//! // A 2x2x1 grid with one inactive cell.
//! let grid = ActnumGrid::new(2, 2, 1, &[1, 1, 0, 1]).unwrap();
//! let poro = FieldConfig::builder("PORO", Arc::new(grid))
//!     .element_type(ElementType::Double)
//!     .build();
//!
//! let mut ens = EnsembleConfig::new();
//! ens.add_node(ConfigNode::field(Arc::clone(&poro), false));
//! ens.add_summary("FOPT", LoadFail::Warn);
//!
//! let mut field = Field::new(poro);
//! field.data_mut().set_f64(2, 0.25);
//! let hit = ens.user_get_node("PORO:2,2,1").unwrap();
//! assert_eq!(field.user_get(hit.index_key.as_deref().unwrap()), Some(0.25));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `strata-core` | Element types, typed buffers, identifiers |
//! | [`grid`] | `strata-grid` | Grid geometry contract and index orders |
//! | [`field`] | `strata-field` | Grid properties, transforms and file codecs |
//! | [`ensemble`] | `strata-ensemble` | Configuration registry and forward initialization |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Element types, typed buffers and identifiers (`strata-core`).
pub use strata_core as types;

/// Grid geometry (`strata-grid`).
///
/// The [`grid::GridGeometry`] trait is how grids from an external geometry
/// library plug in; [`grid::ActnumGrid`] is a small standalone
/// implementation.
pub use strata_grid as grid;

/// Grid properties and their file formats (`strata-field`).
///
/// [`field::Field`] holds one member's values; the [`field::ecl_kw`],
/// [`field::grdecl`], [`field::roff`] and [`field::native`] modules are the
/// codecs.
pub use strata_field as field;

/// Ensemble configuration registry (`strata-ensemble`).
///
/// Build an [`ensemble::EnsembleConfig`] from configuration content and
/// forward-initialize members into an [`ensemble::EnsembleStorage`].
pub use strata_ensemble as ensemble;

/// Common imports for typical Strata usage.
///
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use strata_core::{ElementType, ImplType, NodeId, Truncation, TypedBuffer, VarClass};

    // Grid
    pub use strata_grid::{ActnumGrid, Dims, GridGeometry, IndexOrder};

    // Fields
    pub use strata_field::{
        ExportFormat, ExportTarget, Field, FieldConfig, FieldError, FieldVarType, ImportFormat,
        TransformTable,
    };

    // Ensemble
    pub use strata_ensemble::{
        ConfigContent, ConfigNode, EnsembleConfig, EnsembleError, EnsembleStorage, LoadContext,
        LoadFail, LoadStatus, MemoryStorage, RunArg,
    };
}
