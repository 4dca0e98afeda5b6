//! Task scheduling for detached hooks.
//!
//! A detached hook is not run inline by the dispatcher; it is handed to a
//! [`TaskScheduler`] and dispatch returns without waiting. The scheduler
//! returns a [`TaskHandle`] so completion and failures stay observable —
//! callers that care join the handle, callers that don't simply drop it.
//!
//! There is no ordering guarantee between a detached listener's body and
//! code that runs after dispatch returns. Callers must not rely on one.

use std::fmt;
use std::thread::JoinHandle;

use crate::error::HookError;

/// A unit of work handed to a scheduler.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Schedules detached hook work off the dispatching thread.
///
/// Implementations decide where the task runs (a fresh thread, a pool, a
/// runtime). The contract is non-waiting: `spawn` returns as soon as the
/// task has been handed off.
pub trait TaskScheduler: Send + Sync {
    /// Starts the task and returns a handle for observing its completion.
    ///
    /// `channel` names the hook the task was spawned for; implementations
    /// may use it for thread naming or diagnostics.
    fn spawn(&self, channel: &str, task: Task) -> TaskHandle;
}

/// The default scheduler: one OS thread per task.
///
/// Suitable for the occasional detached listener. Hosts with a worker
/// pool or an async runtime can provide their own [`TaskScheduler`] via
/// `HookManager::set_scheduler`.
#[derive(Debug, Default)]
pub struct ThreadScheduler;

impl ThreadScheduler {
    /// Creates a new thread scheduler.
    pub fn new() -> Self {
        Self
    }
}

impl TaskScheduler for ThreadScheduler {
    fn spawn(&self, channel: &str, task: Task) -> TaskHandle {
        let handle = std::thread::spawn(task);
        TaskHandle::new(channel, handle)
    }
}

/// Handle to a detached task.
///
/// Joining the handle observes completion; a panicking task surfaces as
/// [`HookError::TaskFailed`]. Dropping the handle detaches the task.
pub struct TaskHandle {
    channel: String,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Wraps a thread join handle for the given channel.
    pub fn new(channel: impl Into<String>, handle: JoinHandle<()>) -> Self {
        Self {
            channel: channel.into(),
            handle,
        }
    }

    /// The channel the task was spawned for.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Returns `true` if the task has finished (successfully or not).
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the task finishes.
    ///
    /// A panic inside the task is reported as
    /// [`HookError::TaskFailed`] rather than resuming the unwind.
    pub fn join(self) -> Result<(), HookError> {
        self.handle.join().map_err(|_| HookError::TaskFailed {
            channel: self.channel,
        })
    }
}

impl fmt::Debug for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("channel", &self.channel)
            .field("finished", &self.handle.is_finished())
            .finish()
    }
}
