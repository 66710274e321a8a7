//! Tool catalog and handler registration
//!
//! A [`Tool`] couples the display metadata the workflow builder shows to users
//! (name, description, category) with the async handler that actually runs
//! when a step bound to that tool executes. The [`ToolRegistry`] holds the
//! full set of tools available to a workflow and is consulted in two places:
//!
//! - **Graph construction**: [`WorkflowGraph::add_step`](crate::graph::WorkflowGraph::add_step)
//!   and the patch builder look tools up through the [`ToolCatalog`] trait and
//!   copy a [`ToolInfo`] snapshot onto the new step. Later registry changes do
//!   not retroactively update existing steps.
//! - **Execution**: the engine dispatches each step through the
//!   [`StepExecutor`](crate::executor::StepExecutor) implementation on the
//!   registry, keyed by `tool_id`.
//!
//! The core never interprets what a handler computes; a handler is an opaque
//! `async fn(context) -> Result<Value, _>` (see [`ToolHandler`]).
//!
//! # Examples
//!
//! ```rust
//! use flowgraph_core::registry::{Tool, ToolRegistry, ToolCatalog};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Tool::new(
//!     "utils.echo",
//!     "Echo",
//!     "Returns the global input unchanged",
//!     "utils",
//!     Arc::new(|ctx| Box::pin(async move { Ok(ctx["global_input"].clone()) })),
//! ));
//!
//! assert!(registry.contains("utils.echo"));
//! assert_eq!(registry.info("utils.echo").unwrap().category, "utils");
//! ```

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Boxed future returned by a tool handler
pub type ToolFuture =
    BoxFuture<'static, std::result::Result<Value, Box<dyn std::error::Error + Send + Sync>>>;

/// Async tool handler function
///
/// Receives the invocation context assembled by the engine (`global_input`,
/// `__prev_output`, `step_index`, ... — see [`crate::context`]) and returns
/// either a bare output value or an `{"output": ..., "context": ...}`
/// envelope; see [`StepOutput`](crate::executor::StepOutput) for the decoding
/// rules.
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;

/// Display metadata for a tool
///
/// Copied onto a [`Step`](crate::graph::Step) when the step is created; the
/// step keeps its snapshot even if the registry changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Human-readable tool name
    pub name: String,
    /// Short description shown in the tool catalog
    pub description: String,
    /// Catalog grouping (e.g. `"matrix"`, `"data"`, `"utils"`)
    pub category: String,
}

/// A registered tool: display metadata plus its handler
#[derive(Clone)]
pub struct Tool {
    /// Unique tool identifier steps are bound to
    pub id: String,
    /// Display metadata snapshot source
    pub info: ToolInfo,
    /// The opaque async computation
    pub handler: ToolHandler,
}

impl Tool {
    /// Create a new tool
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
        handler: ToolHandler,
    ) -> Self {
        Self {
            id: id.into(),
            info: ToolInfo {
                name: name.into(),
                description: description.into(),
                category: category.into(),
            },
            handler,
        }
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("id", &self.id)
            .field("info", &self.info)
            .field("handler", &"<function>")
            .finish()
    }
}

/// Read-only view of the tool catalog
///
/// The only interface the graph model and patch builder have onto the
/// registry: existence checks and metadata snapshots at step-creation time.
pub trait ToolCatalog {
    /// Whether a tool with this id is registered
    fn contains(&self, tool_id: &str) -> bool;

    /// Metadata snapshot for a tool, if registered
    fn info(&self, tool_id: &str) -> Option<ToolInfo>;
}

/// Registry of all tools available to a workflow
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any previous tool with the same id
    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.id.clone(), tool);
    }

    /// Look up a tool by id
    pub fn get(&self, tool_id: &str) -> Option<&Tool> {
        self.tools.get(tool_id)
    }

    /// All registered tool ids, sorted for deterministic display
    pub fn tool_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.tools.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_ids())
            .finish()
    }
}

impl ToolCatalog for ToolRegistry {
    fn contains(&self, tool_id: &str) -> bool {
        self.tools.contains_key(tool_id)
    }

    fn info(&self, tool_id: &str) -> Option<ToolInfo> {
        self.tools.get(tool_id).map(|t| t.info.clone())
    }
}
