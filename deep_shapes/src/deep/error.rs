//! Error types for deep shape operations.
//!
//! Every failure is reported before anything is published, so a store stays usable after an
//! error (except after teardown).
use thiserror::Error;

/// Errors that can occur while delivering, evaluating or materializing deep layers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeepError {
    /// A layer handle or the store itself is no longer (or never was) valid for this store.
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Operands cannot be combined: different stores, different hierarchies or a geometry kind
    /// the operator is not defined for.
    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    /// Malformed operator configuration, e.g. an inverted range or a negative distance.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A configured limit of the store would be exceeded.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),
}

/// Result type for deep shape operations.
pub type DeepResult<T> = Result<T, DeepError>;
