//! Error types for the ensemble registry.

use std::io;
use std::path::PathBuf;

use strata_core::NodeId;
use strata_field::FieldError;
use thiserror::Error;

/// Errors from the storage driver.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No record is stored under the key and id.
    #[error("no value stored for {key} at {id}")]
    NotFound {
        /// Node key.
        key: String,
        /// Report step and member.
        id: NodeId,
    },
    /// The backend failed.
    #[error("storage backend failed: {reason}")]
    Backend {
        /// Backend diagnostic.
        reason: String,
    },
}

/// Errors from building the registry or initializing node values.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// A field operation failed.
    #[error(transparent)]
    Field(#[from] FieldError),
    /// The storage driver failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// A file could not be read.
    #[error("can not read {}: {source}", .path.display())]
    Io {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// A value file does not follow its text format.
    #[error("malformed value file {}: {detail}", .path.display())]
    MalformedValues {
        /// The file.
        path: PathBuf,
        /// What went wrong.
        detail: String,
    },
    /// A configuration item is missing arguments or carries bad values.
    #[error("invalid {keyword} configuration: {detail}")]
    InvalidConfig {
        /// Configuration keyword.
        keyword: String,
        /// What is wrong.
        detail: String,
    },
    /// A transform name is not registered.
    #[error("field {key}: unknown transform {name}")]
    UnknownTransform {
        /// Field key.
        key: String,
        /// Transform name as given.
        name: String,
    },
    /// A field was configured without a grid.
    #[error("field {key} needs a grid, none was supplied")]
    MissingGrid {
        /// Field key.
        key: String,
    },
    /// The node kind has no initial-value loader.
    #[error("node {key} of type {kind} can not be initialized from a file")]
    NoInitLoader {
        /// Node key.
        key: String,
        /// Implementation type name.
        kind: &'static str,
    },
}

impl EnsembleError {
    /// Whether this error must abort forward initialization instead of
    /// being reported as a failed node.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Field(e) => e.is_fatal(),
            Self::Storage(_) => true,
            _ => false,
        }
    }
}
