//! Errors raised by the demo tool handlers
//!
//! These surface through the engine as per-step failure reasons; they never
//! abort a run.

use thiserror::Error;

/// Handler-level failure for the demo tools
#[derive(Error, Debug)]
pub enum PrebuiltError {
    /// A required input key was absent from the invocation context
    #[error("missing required input '{0}'")]
    MissingInput(String),

    /// Matrix operands have incompatible shapes
    #[error("matrix dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// An input was present but not the expected shape
    #[error("invalid input shape: {0}")]
    InvalidShape(String),
}
