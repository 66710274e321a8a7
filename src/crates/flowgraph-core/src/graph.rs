//! Workflow graph model: steps and connections
//!
//! A [`WorkflowGraph`] holds the directed graph a user assembles in the
//! workflow builder: [`Step`]s (nodes, each bound to a tool) and
//! [`Connection`]s (edges, "target's input depends on source's output").
//!
//! # Structure
//!
//! ```text
//!            ┌──────────────┐
//!            │ Step (root)  │   tool: matrix.add
//!            └──────┬───────┘
//!           ┌───────┴────────┐
//!           ▼                ▼
//!   ┌──────────────┐  ┌──────────────┐
//!   │ Step         │  │ Step         │
//!   │ data.normalize│  │ utils.log    │
//!   └──────────────┘  └──────────────┘
//! ```
//!
//! # Invariants
//!
//! Enforced continuously by [`add_edge`](WorkflowGraph::add_edge):
//!
//! - no self-loops (`source != target`)
//! - no duplicate edges between the same ordered pair
//! - both endpoints exist
//!
//! Acyclicity is *not* enforced here: it is checked at patch-merge time by
//! [`crate::builder`], and the engine carries a runtime circuit breaker for
//! graphs mutated in ways the builder didn't see (see [`crate::engine`]).
//!
//! # Examples
//!
//! ```rust
//! use flowgraph_core::graph::WorkflowGraph;
//! use flowgraph_core::registry::{Tool, ToolRegistry};
//! use std::sync::Arc;
//!
//! let mut registry = ToolRegistry::new();
//! registry.register(Tool::new(
//!     "utils.echo", "Echo", "echoes input", "utils",
//!     Arc::new(|ctx| Box::pin(async move { Ok(ctx) })),
//! ));
//!
//! let mut graph = WorkflowGraph::new();
//! let first = graph.add_step("utils.echo", &registry).unwrap().id.clone();
//! // A second step auto-chains from the previously added one.
//! let second = graph.add_step("utils.echo", &registry).unwrap().id.clone();
//!
//! assert!(graph.has_edge(&first, &second));
//! assert!(graph.add_step("nope", &registry).is_err());
//! ```

use crate::error::{Result, WorkflowError};
use crate::registry::ToolCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Step identifier — opaque, unique, stable for the step's lifetime
pub type StepId = String;

/// One executable unit in the workflow graph, bound to a tool
///
/// Display metadata is copied from the tool catalog at creation time and is
/// not re-synced if the catalog changes later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Opaque unique identifier, generated at creation time
    pub id: StepId,
    /// Identifier into the tool catalog; determines which handler executes
    pub tool_id: String,
    /// Display name (catalog snapshot)
    pub name: String,
    /// Display description (catalog snapshot)
    pub description: String,
    /// Catalog grouping (catalog snapshot)
    pub category: String,
}

/// A directed dependency between two steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    /// Unique connection identifier
    pub id: String,
    /// Producing step
    pub source: StepId,
    /// Consuming step
    pub target: StepId,
}

/// Incoming/outgoing adjacency computed from the connection set
///
/// Snapshot taken at the start of a run; outgoing lists preserve connection
/// declaration order, which fixes the engine's child visit order.
#[derive(Debug, Clone, Default)]
pub struct GraphAdjacency {
    /// target -> sources
    pub incoming: HashMap<StepId, Vec<StepId>>,
    /// source -> targets, in declaration order
    pub outgoing: HashMap<StepId, Vec<StepId>>,
}

/// The current set of steps and connections
///
/// Supports pure mutations: add step (with auto-chaining), delete step with
/// cascading edge removal, add/delete edge, clear.
#[derive(Debug, Clone, Default)]
pub struct WorkflowGraph {
    steps: Vec<Step>,
    connections: Vec<Connection>,
    /// Anchor for sequential auto-chaining: the most-recently-added step.
    last_added: Option<StepId>,
}

impl WorkflowGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step bound to `tool_id`, snapshotting its catalog metadata
    ///
    /// Fails with [`WorkflowError::UnknownTool`] if the catalog doesn't know
    /// the tool. When the graph already has a most-recently-added step, the
    /// new step is auto-connected from it unless that exact edge exists.
    pub fn add_step(&mut self, tool_id: &str, catalog: &impl ToolCatalog) -> Result<&Step> {
        let info = catalog
            .info(tool_id)
            .ok_or_else(|| WorkflowError::unknown_tool(tool_id))?;

        let step = Step {
            id: Uuid::new_v4().to_string(),
            tool_id: tool_id.to_string(),
            name: info.name,
            description: info.description,
            category: info.category,
        };
        let id = step.id.clone();

        if let Some(prev) = self.last_added.clone() {
            if self.contains_step(&prev) && !self.has_edge(&prev, &id) {
                self.connections.push(Connection {
                    id: Uuid::new_v4().to_string(),
                    source: prev,
                    target: id.clone(),
                });
            }
        }

        self.steps.push(step);
        self.last_added = Some(id);
        let idx = self.steps.len() - 1;
        Ok(&self.steps[idx])
    }

    /// Remove a step and every connection where it is source or target
    pub fn delete_step(&mut self, id: &str) {
        self.steps.retain(|s| s.id != id);
        self.connections
            .retain(|c| c.source != id && c.target != id);
        if self.last_added.as_deref() == Some(id) {
            self.last_added = None;
        }
    }

    /// Add an explicit connection
    ///
    /// Rejected if either endpoint is missing, if `source == target`, or if
    /// the ordered pair already has a connection.
    pub fn add_edge(&mut self, source: &str, target: &str) -> Result<&Connection> {
        if !self.contains_step(source) {
            return Err(WorkflowError::invalid_edge(format!(
                "source step '{source}' does not exist"
            )));
        }
        if !self.contains_step(target) {
            return Err(WorkflowError::invalid_edge(format!(
                "target step '{target}' does not exist"
            )));
        }
        if source == target {
            return Err(WorkflowError::invalid_edge("self-loops are not allowed"));
        }
        if self.has_edge(source, target) {
            return Err(WorkflowError::invalid_edge(format!(
                "connection {source} -> {target} already exists"
            )));
        }

        self.connections.push(Connection {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
        });
        let idx = self.connections.len() - 1;
        Ok(&self.connections[idx])
    }

    /// Remove a connection by id
    pub fn delete_edge(&mut self, id: &str) {
        self.connections.retain(|c| c.id != id);
    }

    /// Empty both collections and reset the auto-chain anchor
    pub fn clear(&mut self) {
        self.steps.clear();
        self.connections.clear();
        self.last_added = None;
    }

    /// All steps, in insertion order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// All connections, in declaration order
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Look up a step by id
    pub fn step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Whether a step with this id exists
    pub fn contains_step(&self, id: &str) -> bool {
        self.steps.iter().any(|s| s.id == id)
    }

    /// Whether a connection for this ordered pair exists
    pub fn has_edge(&self, source: &str, target: &str) -> bool {
        self.connections
            .iter()
            .any(|c| c.source == source && c.target == target)
    }

    /// Compute incoming/outgoing adjacency from the current connection set
    pub fn adjacency(&self) -> GraphAdjacency {
        let mut adjacency = GraphAdjacency::default();
        for conn in &self.connections {
            adjacency
                .outgoing
                .entry(conn.source.clone())
                .or_default()
                .push(conn.target.clone());
            adjacency
                .incoming
                .entry(conn.target.clone())
                .or_default()
                .push(conn.source.clone());
        }
        adjacency
    }

    /// Steps with no incoming connections, in insertion order
    pub fn roots(&self, adjacency: &GraphAdjacency) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|s| adjacency.incoming.get(&s.id).map_or(true, Vec::is_empty))
            .collect()
    }

    /// Insert an externally materialized step (patch merge path).
    ///
    /// The patch builder has already validated the tool id and generated a
    /// unique step id, so no catalog lookup happens here.
    pub(crate) fn insert_step(&mut self, step: Step) {
        self.last_added = Some(step.id.clone());
        self.steps.push(step);
    }

    /// Insert a connection the patch builder has already deduplicated.
    pub(crate) fn insert_connection(&mut self, source: StepId, target: StepId) {
        self.connections.push(Connection {
            id: Uuid::new_v4().to_string(),
            source,
            target,
        });
    }
}
