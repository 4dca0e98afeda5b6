//! The central manager for registering and dispatching hooks and filters.
//!
//! # Dispatch pipeline
//!
//! ```text
//! on(channel, listener)          dispatch(channel, arguments)
//!   → registry                     → matcher resolves the ordered chain
//!                                  → listeners run priority-ascending,
//!                                    sharing one mutable HookContext
//!                                  → propagation stop ends the chain early
//!                                  → context returned to the caller
//! ```
//!
//! Filters are the value-transforming counterpart: `apply_filters`
//! threads a value through the chain registered under the exact channel
//! name and returns the final value. Filters are never pattern-matched
//! and have no propagation stop.
//!
//! # Delegation
//!
//! Listeners registered with [`HookOptions::background`] are forwarded to
//! the configured [`QueueSink`] instead of running; listeners registered
//! with [`HookOptions::detached`] are handed to the [`TaskScheduler`]
//! with a snapshot of the context, and dispatch does not wait for them.
//!
//! # Observability
//!
//! Every dispatch emits lifecycle events (dispatching, no-listeners,
//! propagation-stopped, completed with listener count and duration) to
//! `tracing` and, when configured, to a pluggable logging sink. Emission
//! is best-effort pass-through and never fails a dispatch.
//!
//! # Ownership
//!
//! `HookManager` is a plain owned value: construct one, share it however
//! the host application shares state. There is no process-wide instance.
//! Long-lived managers (test harnesses, REPLs) can [`reset`] back to a
//! pristine state.
//!
//! [`reset`]: HookManager::reset

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};
use tracing::debug;

use crate::compiler::{ChainCompiler, CompiledChain};
use crate::context::{Arguments, HookContext};
use crate::error::HookError;
use crate::matcher::{self, ResolvedHook};
use crate::priority;
use crate::queue::QueueSink;
use crate::registry::{FilterTable, HookOptions, HookTable, Listener};
use crate::scheduler::{TaskHandle, TaskScheduler, ThreadScheduler};

/// Pluggable logging sink for dispatch lifecycle events.
///
/// Receives a short event message and a structured context map. Absence
/// is a no-op; events still reach `tracing` either way.
pub type LogSink = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// Registers listeners and filters, and drives their dispatch.
///
/// # Example
///
/// ```
/// use hookline::{Arguments, HookManager};
/// use serde_json::json;
///
/// let mut hooks = HookManager::new();
/// hooks.on("user.created", |ctx| {
///     ctx.set_data("welcomed", json!(ctx.argument("name").is_some()));
/// });
///
/// let ctx = hooks
///     .dispatch(
///         "user.created",
///         Arguments::from_iter([("name".to_string(), json!("Alice"))]),
///     )
///     .unwrap();
/// assert_eq!(ctx.data("welcomed"), Some(&json!(true)));
/// ```
pub struct HookManager {
    hooks: HookTable,
    filters: FilterTable,
    strict: bool,
    log_sink: Option<LogSink>,
    queue_sink: Option<Arc<dyn QueueSink>>,
    scheduler: Arc<dyn TaskScheduler>,
}

impl HookManager {
    /// Creates an empty manager with default configuration: strict mode
    /// off, no sinks, thread-per-task scheduler.
    pub fn new() -> Self {
        Self {
            hooks: HookTable::new(),
            filters: FilterTable::new(),
            strict: false,
            log_sink: None,
            queue_sink: None,
            scheduler: Arc::new(ThreadScheduler::new()),
        }
    }

    // -----------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------

    /// Registers a listener at the default priority.
    ///
    /// Lower priorities run earlier; ties run in registration order. The
    /// same callback may be registered multiple times and runs each time.
    pub fn on<F>(&mut self, channel: &str, callback: F)
    where
        F: Fn(&mut HookContext) + Send + Sync + 'static,
    {
        self.hooks.insert(
            channel,
            priority::NORMAL,
            Listener {
                callback: Arc::new(callback),
                options: HookOptions::default(),
            },
        );
    }

    /// Registers a listener with an explicit priority and delegation
    /// markers.
    ///
    /// Fails with [`HookError::MissingQueueSink`] if `options.background`
    /// is set and no queue sink has been configured — a background hook
    /// that could never be delivered is a configuration bug, caught here
    /// rather than at dispatch time.
    pub fn on_with<F>(
        &mut self,
        channel: &str,
        priority: i32,
        options: HookOptions,
        callback: F,
    ) -> Result<(), HookError>
    where
        F: Fn(&mut HookContext) + Send + Sync + 'static,
    {
        if options.background && self.queue_sink.is_none() {
            return Err(HookError::MissingQueueSink {
                channel: channel.to_string(),
            });
        }
        self.hooks.insert(
            channel,
            priority,
            Listener {
                callback: Arc::new(callback),
                options,
            },
        );
        Ok(())
    }

    /// Registers a filter at the default priority.
    pub fn add_filter<F>(&mut self, channel: &str, callback: F)
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.filters
            .insert(channel, priority::NORMAL, Arc::new(callback));
    }

    /// Registers a filter with an explicit priority.
    pub fn add_filter_with<F>(&mut self, channel: &str, priority: i32, callback: F)
    where
        F: Fn(Value, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.filters.insert(channel, priority, Arc::new(callback));
    }

    // -----------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------

    /// Turns strict mode on or off (default: off).
    ///
    /// When on, dispatching a channel that resolves zero listeners fails
    /// with [`HookError::NoListeners`] instead of silently returning an
    /// empty context.
    pub fn set_strict_mode(&mut self, strict: bool) {
        self.strict = strict;
    }

    /// Whether strict mode is on.
    pub fn strict_mode(&self) -> bool {
        self.strict
    }

    /// Installs the logging sink for dispatch lifecycle events.
    pub fn set_log_sink<F>(&mut self, sink: F)
    where
        F: Fn(&str, &Value) + Send + Sync + 'static,
    {
        self.log_sink = Some(Arc::new(sink));
    }

    /// Installs the queue sink that background hooks are forwarded to.
    pub fn set_queue_sink(&mut self, sink: Arc<dyn QueueSink>) {
        self.queue_sink = Some(sink);
    }

    /// Replaces the scheduler used for detached hooks and detached
    /// dispatches (default: [`ThreadScheduler`]).
    pub fn set_scheduler(&mut self, scheduler: Arc<dyn TaskScheduler>) {
        self.scheduler = scheduler;
    }

    /// Clears all hook and filter registrations and all configuration:
    /// strict mode, logging sink, queue sink, scheduler override.
    ///
    /// Used to isolate independent test runs or reinitialize a long-lived
    /// manager.
    pub fn reset(&mut self) {
        self.hooks.clear();
        self.filters.clear();
        self.strict = false;
        self.log_sink = None;
        self.queue_sink = None;
        self.scheduler = Arc::new(ThreadScheduler::new());
    }

    // -----------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------

    /// Dispatches a hook, running every matched listener in ascending
    /// priority, then registration order.
    ///
    /// Listeners share one mutable [`HookContext`]; once one of them
    /// stops propagation, the rest are skipped — including later entries
    /// at the same priority and everything in higher-priority buckets.
    /// The final context is returned to the caller.
    ///
    /// With zero matched listeners this is an error only in strict mode;
    /// otherwise the empty context comes back unchanged.
    ///
    /// A panicking listener unwinds into the caller on this path; wrap
    /// callbacks with [`crate::Sandbox`] where containment is required.
    pub fn dispatch(&self, channel: &str, arguments: Arguments) -> Result<HookContext, HookError> {
        let env = self.env();
        env.emit("hook.dispatching", json!({ "channel": channel }));

        let entries = matcher::resolve(&self.hooks, channel);
        let mut context = HookContext::new(channel, arguments);

        if entries.is_empty() {
            env.emit("hook.no_listeners", json!({ "channel": channel }));
            if self.strict {
                return Err(HookError::NoListeners {
                    channel: channel.to_string(),
                });
            }
            return Ok(context);
        }

        let started = Instant::now();
        let executed = run_entries(&env, channel, &entries, &mut context);

        if context.is_propagation_stopped() {
            env.emit(
                "hook.propagation_stopped",
                json!({ "channel": channel, "executed": executed }),
            );
        }
        env.emit(
            "hook.completed",
            json!({
                "channel": channel,
                "listeners": executed,
                "duration_ms": started.elapsed().as_secs_f64() * 1000.0,
            }),
        );

        Ok(context)
    }

    /// Threads a value through the filter chain registered under the
    /// exact channel name.
    ///
    /// `extras` is passed identically to every callback in the chain; it
    /// does not evolve with the value. With no registered filters the
    /// input value is returned unchanged. Filters have no propagation
    /// stop and this method never errors, strict mode or not.
    pub fn apply_filters(&self, channel: &str, value: Value, extras: &[Value]) -> Value {
        let mut current = value;
        for callback in self.filters.chain(channel) {
            current = callback(current, extras);
        }
        current
    }

    /// Runs a whole dispatch on the scheduler, returning immediately.
    ///
    /// The strict-mode check still happens inline, before anything is
    /// scheduled. Completion (and any listener panic) is observable via
    /// the returned handle. The task body emits the same lifecycle events
    /// as [`dispatch`](Self::dispatch), tagged as detached.
    pub fn dispatch_detached(
        &self,
        channel: &str,
        arguments: Arguments,
    ) -> Result<TaskHandle, HookError> {
        let env = self.env();
        env.emit("hook.dispatching", json!({ "channel": channel, "detached": true }));

        let entries = matcher::resolve(&self.hooks, channel);
        if entries.is_empty() && self.strict {
            return Err(HookError::NoListeners {
                channel: channel.to_string(),
            });
        }

        let mut context = HookContext::new(channel, arguments);
        let name = channel.to_string();
        let task = Box::new(move || {
            if entries.is_empty() {
                env.emit(
                    "hook.no_listeners",
                    json!({ "channel": name, "detached": true }),
                );
                return;
            }
            let started = Instant::now();
            let executed = run_entries(&env, &name, &entries, &mut context);
            if context.is_propagation_stopped() {
                env.emit(
                    "hook.propagation_stopped",
                    json!({ "channel": name, "executed": executed, "detached": true }),
                );
            }
            env.emit(
                "hook.completed",
                json!({
                    "channel": name,
                    "listeners": executed,
                    "duration_ms": started.elapsed().as_secs_f64() * 1000.0,
                    "detached": true,
                }),
            );
        });
        Ok(self.scheduler.spawn(channel, task))
    }

    /// Starts several detached dispatches, one task each.
    pub fn dispatch_detached_all(
        &self,
        dispatches: Vec<(String, Arguments)>,
    ) -> Result<Vec<TaskHandle>, HookError> {
        dispatches
            .into_iter()
            .map(|(channel, arguments)| self.dispatch_detached(&channel, arguments))
            .collect()
    }

    /// Resolves a channel's current chain and compiles it into a single
    /// callable for high-frequency dispatch against a static listener
    /// list.
    ///
    /// The compiled chain covers inline listeners only; background- and
    /// detached-marked hooks are skipped. It is a snapshot — listeners
    /// registered afterwards are not picked up.
    pub fn compile_channel(&self, channel: &str) -> CompiledChain {
        let callbacks = matcher::resolve(&self.hooks, channel)
            .into_iter()
            .filter(|entry| !entry.options.background && !entry.options.detached)
            .map(|entry| entry.callback)
            .collect();
        ChainCompiler::new().compile(callbacks)
    }

    fn env(&self) -> DispatchEnv {
        DispatchEnv {
            queue: self.queue_sink.clone(),
            scheduler: self.scheduler.clone(),
            log: self.log_sink.clone(),
        }
    }
}

impl Default for HookManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HookManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookManager")
            .field("strict", &self.strict)
            .field("has_log_sink", &self.log_sink.is_some())
            .field("has_queue_sink", &self.queue_sink.is_some())
            .finish_non_exhaustive()
    }
}

/// The collaborators a running dispatch needs, detached from the manager
/// so whole dispatches can move onto the scheduler.
struct DispatchEnv {
    queue: Option<Arc<dyn QueueSink>>,
    scheduler: Arc<dyn TaskScheduler>,
    log: Option<LogSink>,
}

impl DispatchEnv {
    /// Best-effort event emission: `tracing` always, the sink if present.
    fn emit(&self, message: &str, context: Value) {
        debug!(target: "hookline::dispatch", event = message, %context);
        if let Some(sink) = &self.log {
            sink(message, &context);
        }
    }
}

/// Runs resolved entries against a context, honoring propagation stops
/// and delegation markers. Returns the number of entries consumed.
fn run_entries(
    env: &DispatchEnv,
    channel: &str,
    entries: &[ResolvedHook],
    context: &mut HookContext,
) -> usize {
    let mut executed = 0;
    for entry in entries {
        if context.is_propagation_stopped() {
            break;
        }

        if entry.options.background {
            match &env.queue {
                Some(sink) => sink.push(channel, &Value::Object(context.arguments().clone())),
                // Unreachable through the public API: registration
                // requires the sink. Skip rather than crash the chain.
                None => tracing::error!(
                    channel = %channel,
                    "Background hook has no queue sink; skipping"
                ),
            }
        } else if entry.options.detached {
            let callback = entry.callback.clone();
            let mut snapshot = context.snapshot();
            let handle = env
                .scheduler
                .spawn(channel, Box::new(move || callback(&mut snapshot)));
            context.push_task(handle);
        } else {
            (entry.callback)(context);
        }
        executed += 1;
    }
    executed
}
