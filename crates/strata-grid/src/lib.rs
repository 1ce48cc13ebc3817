//! Grid geometry for Strata grid properties.
//!
//! Reservoir grids are owned by an external geometry library; this crate
//! defines the [`GridGeometry`] trait through which the field engine
//! consumes them (dimensions, active-cell lookup, global indexing), a
//! small ACTNUM-backed implementation used by tests and tools, and the
//! [`IndexOrder`] rules that map `(i, j, k)` to a position in an external
//! dense array.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod actnum;
pub mod error;
pub mod geometry;
pub mod order;

pub use actnum::ActnumGrid;
pub use error::GridError;
pub use geometry::{Dims, GridGeometry};
pub use order::IndexOrder;
