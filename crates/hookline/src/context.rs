//! Hook execution contexts.
//!
//! A [`HookContext`] is created once per dispatch and passed to every
//! listener in that dispatch. Listeners communicate through it in three
//! ways:
//!
//! - **Arguments**: the named values the dispatcher was called with.
//!   Listeners may read and rewrite them in place.
//! - **Data**: an auxiliary key/value store, logically separate from the
//!   arguments. Useful for passing results between listeners without
//!   touching the payload itself.
//! - **Propagation stop**: a one-way flag. Once set, no further listener
//!   in the same dispatch runs.
//!
//! The context also collects the [`TaskHandle`]s of any detached listeners
//! started during the dispatch, so their completion (and failures) stay
//! observable rather than disappearing fire-and-forget.
//!
//! [`ImmutableHookContext`] exposes the same read API but rejects every
//! mutation with [`HookError::ImmutableMutation`]. Use it where listeners
//! must be able to inspect, but never alter, a payload.

use std::fmt;
use std::ops::Deref;

use serde_json::Value;

use crate::error::HookError;
use crate::scheduler::TaskHandle;

/// The named arguments carried by a dispatch.
///
/// Keys are strings, values are arbitrary JSON values. This is
/// `serde_json`'s object map, so it interoperates directly with
/// `serde_json::json!` literals.
pub type Arguments = serde_json::Map<String, Value>;

/// Mutable context shared by every listener in one dispatch.
///
/// # Example
///
/// ```
/// use hookline::{Arguments, HookContext};
/// use serde_json::json;
///
/// let mut ctx = HookContext::new(
///     "user.created",
///     Arguments::from_iter([("name".to_string(), json!("Alice"))]),
/// );
///
/// assert_eq!(ctx.argument("name"), Some(&json!("Alice")));
/// ctx.set_argument("name", json!("Bob"));
/// ctx.set_data("greeted", json!(true));
/// assert!(!ctx.is_propagation_stopped());
/// ```
pub struct HookContext {
    hook_name: String,
    arguments: Arguments,
    data: Arguments,
    propagation_stopped: bool,
    tasks: Vec<TaskHandle>,
}

impl HookContext {
    /// Creates a context for the given channel with initial arguments.
    pub fn new(hook_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            hook_name: hook_name.into(),
            arguments,
            data: Arguments::new(),
            propagation_stopped: false,
            tasks: Vec::new(),
        }
    }

    /// Creates a context with no arguments.
    pub fn empty(hook_name: impl Into<String>) -> Self {
        Self::new(hook_name, Arguments::new())
    }

    /// The name of the channel being dispatched.
    pub fn hook_name(&self) -> &str {
        &self.hook_name
    }

    /// All arguments.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }

    /// Looks up a single argument.
    pub fn argument(&self, key: &str) -> Option<&Value> {
        self.arguments.get(key)
    }

    /// Looks up a single argument, falling back to a default.
    pub fn argument_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.arguments.get(key).unwrap_or(default)
    }

    /// Looks up a required argument.
    ///
    /// Returns an error naming the channel and key if the argument is
    /// missing, for listeners that cannot proceed without it.
    pub fn require_argument(&self, key: &str) -> Result<&Value, anyhow::Error> {
        self.arguments.get(key).ok_or_else(|| {
            anyhow::anyhow!(
                "Argument missing: '{}' not found in context for hook '{}'",
                key,
                self.hook_name
            )
        })
    }

    /// Returns `true` if the argument exists.
    pub fn has_argument(&self, key: &str) -> bool {
        self.arguments.contains_key(key)
    }

    /// Writes an argument, replacing any existing value under the key.
    pub fn set_argument(&mut self, key: impl Into<String>, value: Value) {
        self.arguments.insert(key.into(), value);
    }

    /// Removes an argument, returning it if it existed.
    pub fn remove_argument(&mut self, key: &str) -> Option<Value> {
        self.arguments.remove(key)
    }

    /// Reads an auxiliary data entry.
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Writes an auxiliary data entry.
    ///
    /// Data is kept separate from the arguments: it never reaches queue
    /// sinks and is not merged by [`with`](Self::with).
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) {
        self.data.insert(key.into(), value);
    }

    /// Stops propagation. Remaining listeners in this dispatch will not
    /// run. The flag is one-way; there is no way to clear it.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Returns `true` once propagation has been stopped.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Returns a new context with `new_arguments` merged over the current
    /// arguments.
    ///
    /// Value semantics: the original context is untouched, and the new
    /// context starts with empty data, a cleared propagation flag, and no
    /// task handles.
    pub fn with(&self, new_arguments: Arguments) -> Self {
        let mut merged = self.arguments.clone();
        for (key, value) in new_arguments {
            merged.insert(key, value);
        }
        Self::new(self.hook_name.clone(), merged)
    }

    /// Handles of detached listeners started during this dispatch.
    pub fn task_handles(&self) -> &[TaskHandle] {
        &self.tasks
    }

    /// Takes ownership of the detached task handles, leaving none behind.
    ///
    /// Join these to observe completion or surface panics; dropping them
    /// detaches the tasks entirely.
    pub fn take_task_handles(&mut self) -> Vec<TaskHandle> {
        std::mem::take(&mut self.tasks)
    }

    pub(crate) fn push_task(&mut self, handle: TaskHandle) {
        self.tasks.push(handle);
    }

    /// Copy of name, arguments, data and the propagation flag, with no
    /// task handles. Handed to detached listeners, whose mutations must
    /// stay invisible to the synchronous chain.
    pub(crate) fn snapshot(&self) -> Self {
        Self {
            hook_name: self.hook_name.clone(),
            arguments: self.arguments.clone(),
            data: self.data.clone(),
            propagation_stopped: self.propagation_stopped,
            tasks: Vec::new(),
        }
    }
}

impl fmt::Debug for HookContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookContext")
            .field("hook_name", &self.hook_name)
            .field("arguments", &self.arguments)
            .field("data", &self.data)
            .field("propagation_stopped", &self.propagation_stopped)
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

/// Read-only view of a hook context.
///
/// Exposes the full read API of [`HookContext`] via `Deref`; every
/// mutation attempt fails with [`HookError::ImmutableMutation`] and leaves
/// the context unchanged.
///
/// # Example
///
/// ```
/// use hookline::{Arguments, HookContext, ImmutableHookContext};
/// use serde_json::json;
///
/// let ctx = HookContext::new(
///     "order.created",
///     Arguments::from_iter([("total".to_string(), json!(42))]),
/// );
/// let mut frozen = ImmutableHookContext::from(ctx);
///
/// assert_eq!(frozen.argument("total"), Some(&json!(42)));
/// assert!(frozen.set_argument("total", json!(0)).is_err());
/// ```
#[derive(Debug)]
pub struct ImmutableHookContext {
    inner: HookContext,
}

impl ImmutableHookContext {
    /// Creates an immutable context directly from a name and arguments.
    pub fn new(hook_name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            inner: HookContext::new(hook_name, arguments),
        }
    }

    /// Rejects the write.
    pub fn set_argument(&mut self, _key: impl Into<String>, _value: Value) -> Result<(), HookError> {
        Err(HookError::ImmutableMutation { what: "arguments" })
    }

    /// Rejects the removal.
    pub fn remove_argument(&mut self, _key: &str) -> Result<Option<Value>, HookError> {
        Err(HookError::ImmutableMutation { what: "arguments" })
    }

    /// Rejects the write.
    pub fn set_data(&mut self, _key: impl Into<String>, _value: Value) -> Result<(), HookError> {
        Err(HookError::ImmutableMutation { what: "data" })
    }
}

impl From<HookContext> for ImmutableHookContext {
    fn from(inner: HookContext) -> Self {
        Self { inner }
    }
}

impl Deref for ImmutableHookContext {
    type Target = HookContext;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
