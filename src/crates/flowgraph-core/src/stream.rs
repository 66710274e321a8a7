//! Incremental event streaming for workflow runs
//!
//! [`ExecutionEngine::run_stream`](crate::engine::ExecutionEngine::run_stream)
//! emits an [`EngineEvent`] per log entry as it is appended, strictly in
//! completion order, followed by exactly one terminal event. Consumers
//! receive entries while the run is still in flight:
//!
//! ```text
//!   engine loop ──► mpsc::channel ──► ReceiverStream ──► consumer
//!   (one Entry per step, then Finished or Aborted)
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use flowgraph_core::stream::EngineEvent;
//! use tokio_stream::StreamExt;
//!
//! let mut events = engine.run_stream(graph, r#"{"x":1}"#, registry);
//! while let Some(event) = events.next().await {
//!     match event {
//!         EngineEvent::Entry(entry) => println!("{} {}", entry.step_number, entry.step_name),
//!         EngineEvent::Finished { entries, .. } => println!("done, {entries} entries"),
//!         EngineEvent::Aborted { reason } => eprintln!("aborted: {reason}"),
//!     }
//! }
//! ```

use crate::log::LogEntry;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Buffered entries between the engine loop and a slow consumer.
pub(crate) const DEFAULT_EVENT_BUFFER: usize = 64;

/// One observable moment of a streaming run
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A log entry was appended
    Entry(LogEntry),
    /// The run aborted: a pre-start configuration error (no entries seen) or
    /// the traversal circuit breaker (entries up to the abort were streamed)
    Aborted {
        /// User-facing abort reason
        reason: String,
    },
    /// The stack emptied; the run is over
    Finished {
        /// Total entries streamed
        entries: usize,
        /// Total tasks popped from the traversal stack
        tasks_processed: usize,
    },
}

/// Engine-side event emitter
///
/// Disabled for collecting runs so the traversal code has a single emit path
/// either way. Send failures mean the consumer hung up; the run keeps going
/// and the remaining events are dropped.
pub(crate) struct EventSink {
    tx: Option<mpsc::Sender<EngineEvent>>,
}

impl EventSink {
    /// A sink that drops everything (collecting `run`)
    pub(crate) fn disabled() -> Self {
        Self { tx: None }
    }

    /// A channel-backed sink plus the consumer half
    pub(crate) fn channel(capacity: usize) -> (Self, ReceiverStream<EngineEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx: Some(tx) }, ReceiverStream::new(rx))
    }

    /// Emit one event, awaiting channel capacity
    pub(crate) async fn emit(&self, event: EngineEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event).await;
        }
    }
}
