//! Step execution dispatch
//!
//! The [`StepExecutor`] trait is the core's only boundary with the outside
//! world at run time: given a `tool_id` and an invocation context, produce an
//! output. The engine does not know or care what a given tool computes.
//!
//! Handler failures are data, not exceptions: a failed step becomes a
//! [`StepOutcome::Failure`] whose message is recorded on the log entry, and
//! only that path of the traversal stops. This mirrors how the engine treats
//! per-step errors as contained (see [`crate::engine`]).
//!
//! # Output envelope
//!
//! A handler may return either a plain value or an envelope:
//!
//! ```json
//! { "output": { ... }, "context": { ... } }
//! ```
//!
//! A JSON object carrying an `"output"` key is decoded as the envelope; the
//! optional `"context"` replaces the path's carried context wholesale. Any
//! other value is the output itself and the context is left untouched.

use crate::registry::ToolRegistry;
use async_trait::async_trait;
use serde_json::Value;

/// Decoded result of a successful handler invocation
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    /// The step's output; becomes the children's `__prev_output`
    pub output: Value,
    /// Replacement context for the rest of the path, if the handler returned
    /// one. The core treats it as opaque.
    pub context: Option<Value>,
}

impl StepOutput {
    /// Decode a raw handler return value
    ///
    /// Objects with an `"output"` key are treated as the
    /// `{output, context?}` envelope; everything else is a bare output.
    pub fn from_handler_value(value: Value) -> Self {
        match value {
            Value::Object(mut map) if map.contains_key("output") => {
                let output = map.remove("output").unwrap_or(Value::Null);
                let context = map.remove("context");
                Self { output, context }
            }
            other => Self {
                output: other,
                context: None,
            },
        }
    }
}

/// Result of dispatching one step
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// The handler completed; carries the decoded output
    Success(StepOutput),
    /// The handler failed; carries the captured failure reason
    Failure {
        /// Error message recorded on the log entry
        error: String,
    },
}

/// Opaque async dispatch keyed by `tool_id`
///
/// Implemented by [`ToolRegistry`]; the engine only ever sees this trait, so
/// tests and embedders can substitute their own dispatch.
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Whether this executor can dispatch the given tool
    ///
    /// The engine uses this to defensively skip steps whose tool vanished
    /// between graph construction and the run.
    fn has_tool(&self, tool_id: &str) -> bool;

    /// Invoke the tool's handler with the assembled invocation context
    async fn execute(&self, tool_id: &str, context: Value) -> StepOutcome;
}

#[async_trait]
impl StepExecutor for ToolRegistry {
    fn has_tool(&self, tool_id: &str) -> bool {
        self.get(tool_id).is_some()
    }

    async fn execute(&self, tool_id: &str, context: Value) -> StepOutcome {
        let Some(tool) = self.get(tool_id) else {
            return StepOutcome::Failure {
                error: format!("unknown tool '{tool_id}'"),
            };
        };
        match (tool.handler)(context).await {
            Ok(value) => StepOutcome::Success(StepOutput::from_handler_value(value)),
            Err(err) => StepOutcome::Failure {
                error: err.to_string(),
            },
        }
    }
}
