//! Queue sink collaborator for background hooks.
//!
//! Background-marked hooks are never run inline: the dispatcher forwards
//! `(channel, arguments)` to a [`QueueSink`] and moves on. Delivery,
//! ordering and persistence semantics belong entirely to the sink —
//! from this crate's point of view it is fire-and-forget.

use std::sync::Mutex;

use serde::Serialize;
use serde_json::Value;

/// Receives background hook jobs.
///
/// Implement this over whatever transport the host uses (a Redis list, a
/// database table, an in-process worker queue).
pub trait QueueSink: Send + Sync {
    /// Pushes a job onto the queue.
    fn push(&self, job: &str, payload: &Value);
}

/// A job recorded by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueuedJob {
    /// The channel the background hook was dispatched on.
    pub job: String,
    /// The dispatch arguments at the time of delegation.
    pub payload: Value,
}

/// An in-memory sink that records every pushed job.
///
/// Useful in tests and for local, same-process delivery where a worker
/// drains [`MemorySink::drain`] on its own cadence.
#[derive(Debug, Default)]
pub struct MemorySink {
    jobs: Mutex<Vec<QueuedJob>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every job pushed so far, in push order.
    pub fn jobs(&self) -> Vec<QueuedJob> {
        self.lock().clone()
    }

    /// Removes and returns every recorded job.
    pub fn drain(&self) -> Vec<QueuedJob> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of recorded jobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` if nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<QueuedJob>> {
        // A panicking pusher leaves the job list intact; keep serving it.
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl QueueSink for MemorySink {
    fn push(&self, job: &str, payload: &Value) {
        self.lock().push(QueuedJob {
            job: job.to_string(),
            payload: payload.clone(),
        });
    }
}
