//! Error types for graph construction and workflow execution
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! WorkflowError
//! ├── UnknownTool        - Step/patch references a tool the catalog doesn't know
//! ├── InvalidEdge        - Edge rejected at construction time
//! ├── InvalidInput       - Run input failed to parse as a JSON object
//! ├── NoRootSteps        - Graph has no step without incoming connections
//! ├── RunawayTraversal   - Traversal circuit breaker fired mid-run
//! └── Serialization      - JSON (de)serialization failure
//! ```
//!
//! # Failure classes
//!
//! The engine distinguishes two classes of failure (see [`crate::engine`]):
//!
//! - **Configuration errors** (`InvalidInput`, `NoRootSteps`) are returned as
//!   `Err` before any step executes; the run never starts.
//! - **Per-step handler failures** never surface as a `WorkflowError`. They are
//!   recorded as `status: error` log entries and only prune the failing path.
//!
//! `RunawayTraversal` sits in between: the run aborts, but the partial log is
//!   retained on the [`ExecutionReport`](crate::log::ExecutionReport).
//!
//! # Examples
//!
//! ```rust
//! use flowgraph_core::error::{Result, WorkflowError};
//!
//! fn check_input(text: &str) -> Result<serde_json::Value> {
//!     let parsed: serde_json::Value = serde_json::from_str(text)
//!         .map_err(|e| WorkflowError::invalid_input(e.to_string()))?;
//!     if !parsed.is_object() {
//!         return Err(WorkflowError::invalid_input("expected a JSON object"));
//!     }
//!     Ok(parsed)
//! }
//! ```

use thiserror::Error;

/// Convenience result type using [`WorkflowError`]
pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Error type for all graph and engine operations
///
/// Construction-time errors (`UnknownTool`, `InvalidEdge`) are produced by the
/// graph model and patch builder; run-time errors (`InvalidInput`,
/// `NoRootSteps`, `RunawayTraversal`) by the execution engine.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// A step or patch node referenced a `tool_id` the catalog doesn't know
    ///
    /// Rejected at construction time; an unknown tool never reaches the
    /// execution engine.
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    /// An edge was rejected at construction time
    ///
    /// Covers missing endpoints, self-loops, and duplicate `(source, target)`
    /// pairs.
    #[error("invalid connection: {0}")]
    InvalidEdge(String),

    /// The run input failed to parse as a JSON object
    ///
    /// The engine refuses to start; no step executes and no log entry is
    /// produced.
    #[error("invalid workflow input: {0}")]
    InvalidInput(String),

    /// Every step in the graph has at least one incoming connection
    ///
    /// A run needs at least one root to start from. This also covers the
    /// empty graph.
    #[error("workflow has no root step; every step has an incoming connection")]
    NoRootSteps,

    /// The traversal circuit breaker fired
    ///
    /// The processed-task counter exceeded the budget, which indicates a
    /// cycle the builder didn't catch or runaway branching. The partial log
    /// up to the abort is retained by the caller's report.
    #[error("traversal aborted after {processed} tasks (budget {budget}): the graph may contain a cycle or excessive branching")]
    RunawayTraversal {
        /// Tasks popped from the stack before the abort
        processed: usize,
        /// Budget the counter exceeded
        budget: usize,
    },

    /// JSON serialization/deserialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WorkflowError {
    /// Create an [`WorkflowError::UnknownTool`] error
    pub fn unknown_tool(tool_id: impl Into<String>) -> Self {
        Self::UnknownTool(tool_id.into())
    }

    /// Create an [`WorkflowError::InvalidEdge`] error
    pub fn invalid_edge(reason: impl Into<String>) -> Self {
        Self::InvalidEdge(reason.into())
    }

    /// Create an [`WorkflowError::InvalidInput`] error
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }
}
