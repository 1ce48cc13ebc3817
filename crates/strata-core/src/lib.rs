//! Core types for the Strata ensemble parameter store.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the element types a grid property can be stored as, the type-tagged
//! [`TypedBuffer`] that holds one property's values, the variable-class
//! bitmask and implementation-type tags used by the configuration
//! registry, and the buffer-level error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod element;
pub mod error;
pub mod id;

pub use buffer::{BufferMut, BufferRef, Truncation, TypedBuffer};
pub use element::{Element, ElementType};
pub use error::BufferError;
pub use id::{ImplType, NodeId, VarClass};
