//! # flowgraph-core — workflow graph model and execution engine
//!
//! `flowgraph-core` is the execution heart of a visual workflow builder:
//! users (or an assistant issuing graph patches) assemble a directed graph of
//! tool-bound steps, and the engine walks it, invoking each step's handler
//! with an accumulated per-path context and streaming an ordered log of
//! results back to the display layer.
//!
//! ## Components
//!
//! - [`graph`] — the [`WorkflowGraph`] model: steps, connections, pure
//!   mutations (add/delete/clear), cascade deletes, sequential auto-chaining
//! - [`builder`] — merging externally-proposed [`GraphPatch`] fragments:
//!   validation, id remapping, deduplication, cycle rejection with a
//!   linear-chain fallback
//! - [`registry`] — the tool catalog: display metadata plus opaque async
//!   handlers
//! - [`executor`] — the [`StepExecutor`] dispatch seam between the engine
//!   and tool handlers
//! - [`engine`] — the explicit-stack, depth-first, branch-labeled traversal
//! - [`log`] / [`stream`] — the append-only per-run execution log and its
//!   incremental event stream
//!
//! ## Control flow
//!
//! ```text
//! user / assistant ──patch──► builder ──merge──► WorkflowGraph
//!                                                      │ snapshot
//!                                                      ▼
//! display layer ◄──EngineEvent stream── ExecutionEngine ──dispatch──► StepExecutor
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use flowgraph_core::{ExecutionEngine, Tool, ToolRegistry, WorkflowGraph};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), flowgraph_core::WorkflowError> {
//!     let mut registry = ToolRegistry::new();
//!     registry.register(Tool::new(
//!         "math.double", "Double", "doubles the input", "math",
//!         Arc::new(|ctx| Box::pin(async move {
//!             let x = ctx["global_input"]["x"].as_i64().unwrap_or(0);
//!             Ok(json!({"doubled": x * 2}))
//!         })),
//!     ));
//!
//!     let mut graph = WorkflowGraph::new();
//!     graph.add_step("math.double", &registry)?;
//!
//!     let engine = ExecutionEngine::new();
//!     let report = engine.run(&graph, r#"{"x": 21}"#, &registry).await?;
//!     assert_eq!(report.entries[0].response, json!({"doubled": 42}));
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod executor;
pub mod graph;
pub mod log;
pub mod registry;
pub mod stream;

pub use builder::{apply_patch, apply_single, GraphPatch, PatchEdge, PatchNode, PatchReport};
pub use engine::{path_label, EngineConfig, ExecutionEngine, TaskBudget};
pub use error::{Result, WorkflowError};
pub use executor::{StepExecutor, StepOutcome, StepOutput};
pub use graph::{Connection, GraphAdjacency, Step, StepId, WorkflowGraph};
pub use log::{ExecutionLog, ExecutionReport, LogEntry, RunOutcome, StepStatus};
pub use registry::{Tool, ToolCatalog, ToolHandler, ToolInfo, ToolRegistry};
pub use stream::EngineEvent;
