//! Prebuilt demo tools for flowgraph workflows
//!
//! This crate ships a small, ready-to-run tool catalog so a workflow can be
//! assembled and executed without writing any handlers first. It doubles as
//! a worked example of the three handler shapes the engine supports:
//!
//! - **Input readers** (`matrix.add`, `matrix.multiply`): compute purely from
//!   `global_input`, ignoring upstream outputs.
//! - **Pipeline stages** (`data.normalize`): consume `__prev_output`, and
//!   return an `{"output", "context"}` envelope to pass state downstream.
//! - **Sinks** (`utils.echo`, `utils.log`): terminal steps that surface what
//!   reached them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use flowgraph_core::engine::ExecutionEngine;
//! use flowgraph_core::graph::WorkflowGraph;
//! use flowgraph_prebuilt::demo_registry;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = demo_registry();
//! let mut graph = WorkflowGraph::new();
//! graph.add_step("matrix.add", &registry)?;
//! graph.add_step("data.normalize", &registry)?;
//!
//! let engine = ExecutionEngine::new();
//! let report = engine
//!     .run(&graph, r#"{"a": [[1, 2]], "b": [[3, 4]]}"#, &registry)
//!     .await?;
//! assert!(report.completed());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod tools;

pub use error::PrebuiltError;
pub use tools::demo_registry;
