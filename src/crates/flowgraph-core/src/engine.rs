//! Workflow execution engine
//!
//! The engine takes a snapshot of the current [`WorkflowGraph`] and a JSON
//! base input and performs a multi-root, branch-aware traversal, invoking the
//! [`StepExecutor`] for each reachable step and appending an ordered log of
//! per-step results.
//!
//! # Traversal
//!
//! The walk is an explicit-stack, depth-first traversal rather than
//! recursion, which avoids call-stack limits on deep graphs and puts the
//! circuit-breaker check at a single point between iterations:
//!
//! ```text
//!   roots (no incoming edges) seed the stack, depth 1, context {global_input}
//!
//!   while stack not empty:
//!     pop task ── counter guard ── enrich context ── await executor
//!        │                                              │
//!        │                              success: log entry, push children
//!        │                                       (reverse order, depth+1,
//!        │                                        forked context)
//!        │                              failure: log error entry, prune path
//!        └── vanished step/tool: skip
//! ```
//!
//! Children are pushed in reverse order so the LIFO stack visits them in
//! declaration order, finishing a child's whole subtree before its next
//! sibling — depth-first, never breadth-first.
//!
//! # Path labels and step numbers
//!
//! Each traversal depth has one base-26 letter label ([`path_label`]): depth
//! 1 is `A`, depth 2 is `B`, depth 27 is `AA`. The label is a function of
//! depth only — siblings at the same depth share it and are disambiguated by
//! a per-depth counter assigned at invocation time, so the displayed step
//! numbers of two siblings read `B1`, `B2`. This groups the log visually by
//! "wave" without attempting globally unique branch names.
//!
//! # Ordering and isolation
//!
//! Each handler invocation is awaited in sequence; there is no parallel
//! fan-out even for independent branches. Log entries therefore appear in
//! invocation order, and two branches never interleave inside a single step.
//! Forking at a branch point clones the carried context per child, so sibling
//! branches cannot observe each other's mutations.
//!
//! # Failure classes
//!
//! - invalid input JSON or a graph without roots: `Err` before anything runs
//! - a handler failure: an `error` log entry, that path stops, siblings
//!   continue
//! - circuit breaker: the run aborts with [`RunOutcome::Aborted`] and the
//!   partial log is retained
//!
//! # Examples
//!
//! ```rust,no_run
//! use flowgraph_core::engine::ExecutionEngine;
//! use flowgraph_core::graph::WorkflowGraph;
//! use flowgraph_core::registry::ToolRegistry;
//!
//! # async fn example(graph: WorkflowGraph, registry: ToolRegistry) {
//! let engine = ExecutionEngine::new();
//! let report = engine.run(&graph, r#"{"x": 1}"#, &registry).await.unwrap();
//! for entry in &report.entries {
//!     println!("[{}] {} -> {:?}", entry.step_number, entry.step_name, entry.status);
//! }
//! # }
//! ```

use crate::context;
use crate::error::{Result, WorkflowError};
use crate::executor::{StepExecutor, StepOutcome};
use crate::graph::{StepId, WorkflowGraph};
use crate::log::{ExecutionLog, ExecutionReport, LogEntry, RunOutcome, StepStatus};
use crate::stream::{EngineEvent, EventSink, DEFAULT_EVENT_BUFFER};
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Circuit-breaker budget for one run
///
/// A heuristic guard against unbounded traversal, not a complexity bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskBudget {
    /// `step_count * max(2, connection_count + 1) * 4`
    Auto,
    /// A fixed cap on processed tasks
    Fixed(usize),
}

impl TaskBudget {
    /// Resolve the budget against a graph snapshot
    pub fn resolve(self, step_count: usize, connection_count: usize) -> usize {
        match self {
            TaskBudget::Auto => step_count * std::cmp::max(2, connection_count + 1) * 4,
            TaskBudget::Fixed(limit) => limit,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Circuit-breaker budget; see [`TaskBudget`]
    pub task_budget: TaskBudget,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            task_budget: TaskBudget::Auto,
        }
    }
}

/// The workflow execution engine
///
/// Stateless between runs: each run reads a graph snapshot and owns its log,
/// so a single engine value can serve any number of sequential runs.
#[derive(Debug, Clone, Default)]
pub struct ExecutionEngine {
    config: EngineConfig,
}

/// One pending unit of traversal work
struct Task {
    node: StepId,
    depth: usize,
    label: String,
    /// Context snapshot owned by this path
    carried: Value,
    /// Parent step id and output; `None` at a path start
    prev: Option<(StepId, Value)>,
}

impl ExecutionEngine {
    /// Engine with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with an explicit configuration
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run the workflow to completion and collect the full log
    ///
    /// `base_input` is the user's JSON text; it must parse as an object or
    /// the run refuses to start. `Err` is returned only for the pre-start
    /// configuration failures ([`WorkflowError::InvalidInput`],
    /// [`WorkflowError::NoRootSteps`]); a circuit-breaker abort comes back as
    /// `Ok` with [`RunOutcome::Aborted`] and the partial log.
    pub async fn run(
        &self,
        graph: &WorkflowGraph,
        base_input: &str,
        executor: &dyn StepExecutor,
    ) -> Result<ExecutionReport> {
        self.run_inner(graph, base_input, executor, &EventSink::disabled())
            .await
    }

    /// Run the workflow, streaming each log entry as it is appended
    ///
    /// Takes owned arguments because the run proceeds on a spawned task; the
    /// graph argument is the snapshot the run reads (live mutations after
    /// this call are not observed). The stream yields one
    /// [`EngineEvent::Entry`] per step in completion order, then exactly one
    /// [`EngineEvent::Finished`] or [`EngineEvent::Aborted`]. Pre-start
    /// configuration errors surface as an `Aborted` event with no entries.
    pub fn run_stream(
        &self,
        graph: WorkflowGraph,
        base_input: impl Into<String>,
        executor: Arc<dyn StepExecutor>,
    ) -> ReceiverStream<EngineEvent> {
        let (sink, stream) = EventSink::channel(DEFAULT_EVENT_BUFFER);
        let engine = self.clone();
        let base_input = base_input.into();
        tokio::spawn(async move {
            let result = engine
                .run_inner(&graph, &base_input, executor.as_ref(), &sink)
                .await;
            let terminal = match result {
                Ok(report) => match report.outcome {
                    RunOutcome::Completed => EngineEvent::Finished {
                        entries: report.entries.len(),
                        tasks_processed: report.tasks_processed,
                    },
                    RunOutcome::Aborted { reason } => EngineEvent::Aborted { reason },
                },
                Err(err) => EngineEvent::Aborted {
                    reason: err.to_string(),
                },
            };
            sink.emit(terminal).await;
        });
        stream
    }

    async fn run_inner(
        &self,
        graph: &WorkflowGraph,
        base_input: &str,
        executor: &dyn StepExecutor,
        sink: &EventSink,
    ) -> Result<ExecutionReport> {
        // Fail fast, before touching the graph.
        let parsed: Value = serde_json::from_str(base_input)
            .map_err(|e| WorkflowError::invalid_input(format!("input is not valid JSON: {e}")))?;
        if !parsed.is_object() {
            return Err(WorkflowError::invalid_input("input must be a JSON object"));
        }

        let adjacency = graph.adjacency();
        let roots = graph.roots(&adjacency);
        if roots.is_empty() {
            return Err(WorkflowError::NoRootSteps);
        }

        let budget = self
            .config
            .task_budget
            .resolve(graph.steps().len(), graph.connections().len());
        debug!(
            roots = roots.len(),
            steps = graph.steps().len(),
            budget,
            "starting workflow run"
        );

        // Reverse so the first root (insertion order) is popped first.
        let seed = context::seed(parsed);
        let mut stack: Vec<Task> = roots
            .iter()
            .rev()
            .map(|root| Task {
                node: root.id.clone(),
                depth: 1,
                label: path_label(1),
                carried: seed.clone(),
                prev: None,
            })
            .collect();

        let mut log = ExecutionLog::new();
        let mut depth_counters: HashMap<usize, usize> = HashMap::new();
        let mut processed = 0usize;
        let mut outcome = RunOutcome::Completed;

        while let Some(task) = stack.pop() {
            processed += 1;
            if processed > budget {
                let err = WorkflowError::RunawayTraversal { processed, budget };
                warn!(processed, budget, "traversal budget exceeded, aborting run");
                outcome = RunOutcome::Aborted {
                    reason: err.to_string(),
                };
                break;
            }

            // Not expected within one synchronous run, handled defensively.
            let Some(step) = graph.step(&task.node) else {
                debug!(node = %task.node, "skipping task whose step is gone");
                continue;
            };
            if !executor.has_tool(&step.tool_id) {
                debug!(tool_id = %step.tool_id, "skipping step whose tool is gone");
                continue;
            }

            let counter = depth_counters.entry(task.depth).or_insert(0);
            *counter += 1;
            let step_number = format!("{}{}", task.label, counter);

            let invocation = context::enrich(
                &task.carried,
                task.prev.as_ref().map(|(parent, output)| (parent, output)),
                task.depth,
                &task.label,
            );

            match executor.execute(&step.tool_id, invocation.clone()).await {
                StepOutcome::Success(result) => {
                    let entry = LogEntry {
                        step_number,
                        step_index: task.depth,
                        path_id: task.label.clone(),
                        tool_id: step.tool_id.clone(),
                        step_name: step.name.clone(),
                        request: invocation,
                        response: result.output.clone(),
                        status: StepStatus::Success,
                        timestamp: Utc::now(),
                    };
                    sink.emit(EngineEvent::Entry(entry.clone())).await;
                    log.append(entry);

                    // A handler-returned context replaces the path's carried
                    // context wholesale; otherwise the path keeps its own.
                    let carried_next = result.context.unwrap_or_else(|| task.carried.clone());
                    if let Some(children) = adjacency.outgoing.get(&task.node) {
                        for child in children.iter().rev() {
                            stack.push(Task {
                                node: child.clone(),
                                depth: task.depth + 1,
                                label: path_label(task.depth + 1),
                                carried: carried_next.clone(),
                                prev: Some((task.node.clone(), result.output.clone())),
                            });
                        }
                    }
                }
                StepOutcome::Failure { error } => {
                    debug!(step = %step.id, tool_id = %step.tool_id, %error, "step failed, pruning path");
                    let entry = LogEntry {
                        step_number,
                        step_index: task.depth,
                        path_id: task.label.clone(),
                        tool_id: step.tool_id.clone(),
                        step_name: step.name.clone(),
                        request: invocation,
                        response: Value::String(error),
                        status: StepStatus::Error,
                        timestamp: Utc::now(),
                    };
                    sink.emit(EngineEvent::Entry(entry.clone())).await;
                    log.append(entry);
                    // Children are not scheduled; sibling paths continue.
                }
            }
        }

        Ok(ExecutionReport {
            entries: log.into_entries(),
            outcome,
            tasks_processed: processed,
        })
    }
}

/// Base-26 letter label for a traversal depth (1-based)
///
/// `1 -> "A"`, `26 -> "Z"`, `27 -> "AA"`, `28 -> "AB"`. The label depends on
/// depth only; siblings at the same depth share it.
pub fn path_label(depth: usize) -> String {
    let mut n = depth;
    let mut letters = Vec::new();
    while n > 0 {
        n -= 1;
        letters.push((b'A' + (n % 26) as u8) as char);
        n /= 26;
    }
    letters.iter().rev().collect()
}
