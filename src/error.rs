//! Error types for the size-of engine
//!
//! Provides unified error handling using thiserror. Limit hits are not errors;
//! they are reported through [`crate::sizeof::Outcome`].

use thiserror::Error;

use crate::graph::ObjectId;

// == SizeOf Error Enum ==
/// Unified error type for the size-of engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeOfError {
    /// A limit or layout parameter is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The shape of an object of a fail-closed class could not be determined
    #[error("Unmeasurable type: {class}")]
    UnmeasurableType { class: String },

    /// Handle does not refer to a live object in the heap
    #[error("Unknown object: {0}")]
    UnknownObject(ObjectId),

    /// Field does not exist on the object, or is not a reference slot
    #[error("Unknown field '{field}' on {class}")]
    UnknownField { class: String, field: String },
}

// == Result Type Alias ==
/// Convenience Result type for the size-of engine.
pub type Result<T> = std::result::Result<T, SizeOfError>;
