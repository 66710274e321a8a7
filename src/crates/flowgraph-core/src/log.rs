//! Execution log: the ordered record of per-step outcomes for one run
//!
//! Entries are appended strictly in the order steps complete — which, given
//! the engine's sequential awaits, is also invocation order. The log lives
//! for exactly one run: the engine builds a fresh [`ExecutionLog`] per run
//! and hands it back inside an [`ExecutionReport`]; nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outcome of one step invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// The handler completed
    Success,
    /// The handler failed; the path was pruned
    Error,
}

/// One appended record of a step invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Displayed step number: path label plus per-depth counter (`"A1"`, `"B2"`)
    pub step_number: String,
    /// Depth along the path, starting at 1
    pub step_index: usize,
    /// Depth-keyed branch label (`"A"`, `"B"`, ...)
    pub path_id: String,
    /// Tool the step dispatched to
    pub tool_id: String,
    /// Step display name (catalog snapshot)
    pub step_name: String,
    /// The invocation context the handler received
    pub request: Value,
    /// Handler output on success, failure reason on error
    pub response: Value,
    /// Success or error
    pub status: StepStatus,
    /// Appended-at time
    pub timestamp: DateTime<Utc>,
}

/// Append-only entry sequence for one run
#[derive(Debug, Clone, Default)]
pub struct ExecutionLog {
    entries: Vec<LogEntry>,
}

impl ExecutionLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Entries appended so far, in completion order
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the log, yielding its entries
    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The stack emptied; every reachable path ran to completion or pruning
    Completed,
    /// The traversal circuit breaker fired; the log holds the partial run
    Aborted {
        /// User-facing abort reason
        reason: String,
    },
}

/// Final result of one run
///
/// The caller owns the report; dropping it discards the log. Nothing is
/// persisted between runs.
#[derive(Debug, Clone)]
pub struct ExecutionReport {
    /// Per-step entries in completion order
    pub entries: Vec<LogEntry>,
    /// Completed or aborted
    pub outcome: RunOutcome,
    /// Total tasks popped from the traversal stack
    pub tasks_processed: usize,
}

impl ExecutionReport {
    /// Whether the run ran to completion
    pub fn completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }
}
