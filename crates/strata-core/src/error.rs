//! Error type for element-level buffer operations.

use thiserror::Error;

use crate::element::ElementType;

/// Errors from typed buffer operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BufferError {
    /// The operation is not defined for this element type
    /// (numeric transforms and truncation on int32 storage).
    #[error("{op} is not supported for {element_type} buffers")]
    UnsupportedOperation {
        /// Name of the rejected operation.
        op: &'static str,
        /// Element type of the buffer it was invoked on.
        element_type: ElementType,
    },
    /// Two buffers were expected to hold the same element type.
    #[error("element type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// Element type the operation required.
        expected: ElementType,
        /// Element type actually supplied.
        found: ElementType,
    },
    /// Two buffers were expected to have the same length.
    #[error("length mismatch: expected {expected} elements, found {found}")]
    LengthMismatch {
        /// Required number of elements (or bytes for raw decoding).
        expected: usize,
        /// Supplied number.
        found: usize,
    },
}

impl BufferError {
    /// Whether this error indicates a data-integrity problem the caller
    /// must not recover from.
    ///
    /// Unsupported operations and type mismatches are integrity errors;
    /// a length mismatch is an ordinary load failure.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::LengthMismatch { .. })
    }
}
