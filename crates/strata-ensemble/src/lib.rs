//! Ensemble configuration registry for Strata.
//!
//! An [`EnsembleConfig`] names every quantity tracked per ensemble member:
//! grid properties ([`strata_field`]), scalar parameter groups, summary
//! vectors, general data vectors, surfaces and containers grouping them.
//! It is built once from configuration content, then shared read-only by
//! the threads that load and write member values.
//!
//! Forward initialization ([`EnsembleConfig::forward_init`]) reads the
//! initial values produced by a forward model from a run directory and
//! stores them through an [`EnsembleStorage`] driver.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod content;
pub mod error;
pub mod forward_init;
pub mod gen_data;
pub mod gen_kw;
pub mod loader;
pub mod matcher;
pub mod node;
pub mod refcase;
pub mod registry;
pub mod storage;
pub mod summary;
pub mod surface;

pub use content::{ConfigContent, ConfigItem, Options};
pub use error::{EnsembleError, StorageError};
pub use forward_init::{ForwardInitOutcome, LoadStatus, RunArg};
pub use gen_data::{GenDataConfig, GenDataFormat};
pub use gen_kw::GenKwConfig;
pub use loader::LoadContext;
pub use matcher::SummaryKeyMatcher;
pub use node::{ConfigNode, NodeKind};
pub use refcase::SummaryRefcase;
pub use registry::{EnsembleConfig, ResolvedKey};
pub use storage::{EnsembleStorage, MemoryStorage};
pub use summary::{LoadFail, SummaryConfig};
pub use surface::SurfaceConfig;
