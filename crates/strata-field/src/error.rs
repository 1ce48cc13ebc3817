//! Error types for the field engine.

use std::io;
use std::path::PathBuf;

use strata_core::{BufferError, ElementType};
use thiserror::Error;

use crate::format::ExportFormat;

/// A malformed `"i,j,k"` cell key. Indices in messages are 1-based.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UserKeyError {
    /// The key is not three comma-separated integers.
    #[error("failed to parse \"{key}\" as three integers")]
    Malformed {
        /// The offending key.
        key: String,
    },
    /// At least one index is outside the grid.
    #[error("ijk: {i}, {j}, {k} is invalid")]
    OutOfRange {
        /// I index as given.
        i: i64,
        /// J index as given.
        j: i64,
        /// K index as given.
        k: i64,
    },
    /// The cell exists but is not active.
    #[error("ijk: {i}, {j}, {k} is an inactive cell")]
    Inactive {
        /// I index as given.
        i: usize,
        /// J index as given.
        j: usize,
        /// K index as given.
        k: usize,
    },
}

impl UserKeyError {
    /// Numeric reason code: 1 malformed, 2 out of range, 3 inactive.
    pub fn code(&self) -> u8 {
        match self {
            Self::Malformed { .. } => 1,
            Self::OutOfRange { .. } => 2,
            Self::Inactive { .. } => 3,
        }
    }
}

/// Errors from loading, exporting or serializing fields.
#[derive(Debug, Error)]
pub enum FieldError {
    /// An I/O error occurred during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// A buffer-level operation failed.
    #[error(transparent)]
    Buffer(#[from] BufferError),
    /// The input file does not exist or cannot be read.
    #[error("file not found: {}", .path.display())]
    NotFound {
        /// The missing file.
        path: PathBuf,
    },
    /// A native record carries the tag of another implementation type.
    #[error("record tag {found} does not match expected tag {expected}")]
    TagMismatch {
        /// Tag the reader required.
        expected: i32,
        /// Tag found in the stream.
        found: i32,
    },
    /// The number of values in a file disagrees with the configuration.
    #[error("{key}: file holds {found} values, configuration expects {expected}")]
    SizeMismatch {
        /// Field key.
        key: String,
        /// Expected number of values.
        expected: usize,
        /// Number found in the file.
        found: usize,
    },
    /// Init data for inactive cells has another element type than the
    /// field values it completes.
    #[error("{key}: init data is {found}, field values are {expected}")]
    InitTypeMismatch {
        /// Field key.
        key: String,
        /// Element type of the field values.
        expected: ElementType,
        /// Element type of the init data.
        found: ElementType,
    },
    /// The keyword or parameter is not present in the file.
    #[error("can not locate keyword {keyword} in {}", .path.display())]
    KeywordNotFound {
        /// Keyword that was searched for.
        keyword: String,
        /// File that was searched.
        path: PathBuf,
    },
    /// The file content does not follow the format.
    #[error("malformed {format} data: {detail}")]
    Malformed {
        /// Format being decoded.
        format: &'static str,
        /// What went wrong.
        detail: String,
    },
    /// The element type pair is outside the export matrix.
    #[error("a {from} field can not be exported as {to}")]
    UnsupportedExport {
        /// Element type of the field.
        from: ElementType,
        /// Requested target element type.
        to: ElementType,
    },
    /// The element type pair is outside the import matrix.
    #[error("{from} data can not be imported into a {to} field")]
    UnsupportedImport {
        /// Element type found in the file.
        from: ElementType,
        /// Element type of the field.
        to: ElementType,
    },
    /// The init transform produced NaN or infinite values.
    #[error("after applying the init transform field {key} contains nan/inf or similar malformed values")]
    NonFinite {
        /// Field key.
        key: String,
    },
    /// The export format and target do not fit together.
    #[error("{format:?} export needs a {expected} target")]
    ExportTarget {
        /// Requested format.
        format: ExportFormat,
        /// Kind of target the format writes to.
        expected: &'static str,
    },
    /// No init file is configured for a field that was asked to initialize.
    #[error("no init file configured for field {key}")]
    NoInitFile {
        /// Field key.
        key: String,
    },
    /// A transform name is not registered.
    #[error("unknown transform {name}")]
    UnknownTransform {
        /// Name as given.
        name: String,
    },
}

impl FieldError {
    /// Whether this error is a data-integrity failure that callers must
    /// propagate instead of recovering from.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::TagMismatch { .. }
            | Self::UnsupportedExport { .. }
            | Self::UnsupportedImport { .. }
            | Self::NonFinite { .. }
            | Self::ExportTarget { .. } => true,
            Self::Buffer(e) => e.is_fatal(),
            _ => false,
        }
    }
}
