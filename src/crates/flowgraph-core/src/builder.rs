//! Graph patch merging
//!
//! A [`GraphPatch`] is an externally-proposed graph fragment — typically
//! emitted by an assistant — of node specs (`{id?, tool_id}`) and edge specs
//! (`{source, target}`) referencing new or existing step ids. [`apply_patch`]
//! validates the fragment and merges it into a live [`WorkflowGraph`], or
//! replaces the graph wholesale when the fragment requests a reset.
//!
//! Partial application is acceptable by contract; invalid pieces are dropped,
//! never errors:
//!
//! - node specs with an unknown `tool_id` are dropped
//! - an authored node id colliding with the live graph (when not resetting)
//!   or with an earlier fragment node gets a fresh id, and every edge
//!   reference to the original id is remapped
//! - edge specs referencing unresolvable ids, self-loops, and
//!   fragment-internal duplicates are dropped
//! - a fragment yielding zero valid nodes is discarded wholesale, edges
//!   included
//!
//! The one structural guarantee: the caller never ends up with a cyclic or
//! unreachable new sub-graph. If the fragment specifies no edges at all, a
//! linear chain is synthesized over the new nodes in the order given; if the
//! fragment's new-node edges contain a cycle, the entire candidate edge set
//! is replaced by that same chain.
//!
//! # Examples
//!
//! ```rust
//! use flowgraph_core::builder::{apply_patch, GraphPatch, PatchNode, PatchEdge};
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
//! let patch = GraphPatch {
//!     reset: false,
//!     nodes: vec![
//!         PatchNode { id: Some("a".into()), tool_id: "utils.echo".into() },
//!         PatchNode { id: Some("b".into()), tool_id: "utils.echo".into() },
//!     ],
//!     edges: vec![], // no edges: a linear chain a -> b is synthesized
//! };
//!
//! let report = apply_patch(&mut graph, patch, &registry);
//! assert_eq!(report.steps_added, 2);
//! assert!(graph.has_edge("a", "b"));
//! ```

use crate::error::Result;
use crate::graph::{Step, StepId, WorkflowGraph};
use crate::registry::ToolCatalog;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;
use uuid::Uuid;

/// One proposed node in a patch fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchNode {
    /// Authored id other patch edges may reference; generated when absent
    #[serde(default)]
    pub id: Option<String>,
    /// Tool the new step binds to
    pub tool_id: String,
}

/// One proposed edge in a patch fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchEdge {
    /// Source step: a fragment node's authored id or an existing step id
    pub source: String,
    /// Target step: a fragment node's authored id or an existing step id
    pub target: String,
}

/// An externally-proposed graph fragment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphPatch {
    /// Replace the entire graph instead of appending
    #[serde(default)]
    pub reset: bool,
    /// Proposed nodes
    #[serde(default)]
    pub nodes: Vec<PatchNode>,
    /// Proposed edges
    #[serde(default)]
    pub edges: Vec<PatchEdge>,
}

/// What a patch application actually did
///
/// Counts feed the UI toast ("3 steps added", "fragment edges replaced by a
/// chain") after an assistant-issued patch lands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    /// Steps materialized into the graph
    pub steps_added: usize,
    /// Node specs dropped (unknown tool)
    pub nodes_dropped: usize,
    /// Connections created
    pub edges_added: usize,
    /// Edge specs dropped (unresolvable ids, self-loops, duplicates)
    pub edges_dropped: usize,
    /// A linear chain over the new nodes was synthesized, either because the
    /// fragment had no edges or because its new-node edges formed a cycle
    pub linear_chain: bool,
    /// The fragment replaced the whole graph
    pub reset: bool,
}

/// Merge a patch fragment into the graph
pub fn apply_patch(
    graph: &mut WorkflowGraph,
    patch: GraphPatch,
    catalog: &impl ToolCatalog,
) -> PatchReport {
    let GraphPatch {
        reset,
        nodes,
        edges,
    } = patch;
    let mut report = PatchReport {
        reset,
        ..PatchReport::default()
    };

    // Materialize node specs, remapping colliding authored ids.
    let mut remap: HashMap<String, StepId> = HashMap::new();
    let mut new_ids: HashSet<StepId> = HashSet::new();
    let mut new_steps: Vec<Step> = Vec::new();
    for spec in nodes {
        let Some(info) = catalog.info(&spec.tool_id) else {
            debug!(tool_id = %spec.tool_id, "dropping patch node with unknown tool");
            report.nodes_dropped += 1;
            continue;
        };
        let final_id = match spec.id {
            Some(authored) => {
                let collides = new_ids.contains(&authored)
                    || (!reset && graph.contains_step(&authored));
                let final_id = if collides {
                    Uuid::new_v4().to_string()
                } else {
                    authored.clone()
                };
                remap.insert(authored, final_id.clone());
                final_id
            }
            None => Uuid::new_v4().to_string(),
        };
        new_ids.insert(final_id.clone());
        new_steps.push(Step {
            id: final_id,
            tool_id: spec.tool_id,
            name: info.name,
            description: info.description,
            category: info.category,
        });
    }

    // Zero valid nodes: the whole fragment is discarded, edges included.
    if new_steps.is_empty() {
        report.reset = false;
        return report;
    }
    report.steps_added = new_steps.len();

    // Resolve edge references against the remapped fragment ids, falling
    // back to live steps when not resetting.
    let resolve = |id: &str| -> Option<StepId> {
        if let Some(mapped) = remap.get(id) {
            return Some(mapped.clone());
        }
        if !reset && graph.contains_step(id) {
            return Some(id.to_string());
        }
        None
    };

    let no_edges_specified = edges.is_empty();
    let mut seen: HashSet<(StepId, StepId)> = HashSet::new();
    let mut candidate: Vec<(StepId, StepId)> = Vec::new();
    for spec in edges {
        let (Some(source), Some(target)) = (resolve(&spec.source), resolve(&spec.target)) else {
            report.edges_dropped += 1;
            continue;
        };
        if source == target {
            report.edges_dropped += 1;
            continue;
        }
        if !seen.insert((source.clone(), target.clone())) {
            report.edges_dropped += 1;
            continue;
        }
        candidate.push((source, target));
    }

    if no_edges_specified {
        candidate = linear_chain(&new_steps);
        report.linear_chain = !candidate.is_empty();
    } else if fragment_has_cycle(&new_ids, &candidate) {
        debug!(
            steps = new_steps.len(),
            "patch fragment edges form a cycle; falling back to a linear chain"
        );
        candidate = linear_chain(&new_steps);
        report.linear_chain = true;
    }

    if reset {
        graph.clear();
    }
    for step in new_steps {
        graph.insert_step(step);
    }
    for (source, target) in candidate {
        if graph.has_edge(&source, &target) {
            report.edges_dropped += 1;
            continue;
        }
        graph.insert_connection(source, target);
        report.edges_added += 1;
    }
    report
}

/// Single-step shorthand: append one step of this tool, optionally clearing
/// the graph first
pub fn apply_single<'g>(
    graph: &'g mut WorkflowGraph,
    tool_id: &str,
    reset: bool,
    catalog: &impl ToolCatalog,
) -> Result<&'g Step> {
    if reset {
        graph.clear();
    }
    graph.add_step(tool_id, catalog)
}

/// Chain the new steps in the order given: `s0 -> s1 -> ... -> sN`
fn linear_chain(steps: &[Step]) -> Vec<(StepId, StepId)> {
    steps
        .windows(2)
        .map(|pair| (pair[0].id.clone(), pair[1].id.clone()))
        .collect()
}

/// Kahn's algorithm over the fragment's new nodes and the candidate edges
/// between them. Edges touching existing steps can't close a cycle through
/// the fragment alone, so they are excluded here.
fn fragment_has_cycle(new_ids: &HashSet<StepId>, candidate: &[(StepId, StepId)]) -> bool {
    let internal: Vec<&(StepId, StepId)> = candidate
        .iter()
        .filter(|(s, t)| new_ids.contains(s) && new_ids.contains(t))
        .collect();

    let mut indegree: HashMap<&str, usize> = new_ids.iter().map(|id| (id.as_str(), 0)).collect();
    let mut outgoing: HashMap<&str, Vec<&str>> = HashMap::new();
    for (source, target) in &internal {
        *indegree.entry(target.as_str()).or_insert(0) += 1;
        outgoing
            .entry(source.as_str())
            .or_default()
            .push(target.as_str());
    }

    let mut queue: Vec<&str> = indegree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0usize;
    while let Some(id) = queue.pop() {
        visited += 1;
        for next in outgoing.get(id).into_iter().flatten() {
            if let Some(degree) = indegree.get_mut(next) {
                *degree -= 1;
                if *degree == 0 {
                    queue.push(next);
                }
            }
        }
    }
    visited < new_ids.len()
}
