//! Error types for hook registration and dispatch.

/// Errors that can occur while registering or dispatching hooks.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Strict mode is on and dispatch resolved zero listeners.
    #[error("No listeners found for hook: {channel}")]
    NoListeners {
        /// The channel name that was dispatched.
        channel: String,
    },

    /// A write was attempted on an immutable context.
    #[error("Cannot modify {what} in an immutable context.")]
    ImmutableMutation {
        /// What the caller tried to modify ("arguments" or "data").
        what: &'static str,
    },

    /// A background-marked hook was registered with no queue sink configured.
    #[error("Background hook '{channel}' registered without a queue sink.")]
    MissingQueueSink {
        /// The channel the hook was registered under.
        channel: String,
    },

    /// A detached task panicked. Surfaced when the caller joins its handle.
    #[error("Detached task for hook '{channel}' panicked.")]
    TaskFailed {
        /// The channel the task was spawned for.
        channel: String,
    },
}
