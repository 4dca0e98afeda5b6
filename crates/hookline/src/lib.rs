//! Priority-ordered hook and filter dispatch.
//!
//! `hookline` is an in-process event/hook dispatch library. Callers
//! register listeners ("hooks") and value-transforming handlers
//! ("filters") against named channels, then trigger those channels to run
//! the registered callbacks in priority order.
//!
//! # Features
//!
//! - **Priority-ordered dispatch**: lower priorities run earlier; ties
//!   run in registration order. Named constants in [`priority`].
//! - **Wildcard and regex channels**: register under `user.*` or
//!   `#^order\.(created|updated)$#` and match whole families of events.
//! - **Shared context**: every listener in a dispatch reads and mutates
//!   one [`HookContext`]; any listener can stop propagation.
//! - **Filters**: thread a value through a chain of transformers with
//!   [`HookManager::apply_filters`].
//! - **Delegation**: per-listener markers hand work to a queue sink
//!   (background) or a task scheduler (detached) instead of running
//!   inline.
//! - **Sandboxing**: opt-in failure containment and soft resource-limit
//!   observation around individual callbacks via [`Sandbox`].
//! - **Chain compilation**: pre-flatten a hot channel's listener list
//!   into one composed closure with [`ChainCompiler`].
//!
//! # Quick start
//!
//! ```
//! use hookline::{priority, Arguments, HookManager, HookOptions};
//! use serde_json::json;
//!
//! let mut hooks = HookManager::new();
//!
//! // Listeners run in priority order and share the context.
//! hooks.on_with("user.created", priority::HIGH, HookOptions::default(), |ctx| {
//!     ctx.set_data("validated", json!(true));
//! }).unwrap();
//! hooks.on("user.*", |ctx| {
//!     ctx.set_data("audited", json!(ctx.hook_name()));
//! });
//!
//! let ctx = hooks
//!     .dispatch(
//!         "user.created",
//!         Arguments::from_iter([("name".to_string(), json!("Alice"))]),
//!     )
//!     .unwrap();
//! assert_eq!(ctx.data("validated"), Some(&json!(true)));
//! assert_eq!(ctx.data("audited"), Some(&json!("user.created")));
//!
//! // Filters transform a value instead of mutating a context.
//! hooks.add_filter("title.render", |value, _extras| {
//!     json!(format!("{}!", value.as_str().unwrap_or_default()))
//! });
//! let title = hooks.apply_filters("title.render", json!("Hello"), &[]);
//! assert_eq!(title, json!("Hello!"));
//! ```
//!
//! # Concurrency
//!
//! Dispatch is synchronous and single-threaded: callbacks run on the
//! calling thread, in order, sharing one `&mut HookContext`. Detached
//! listeners get a context *snapshot* on the scheduler; their effects are
//! invisible to the synchronous chain and observable only through the
//! [`TaskHandle`]s collected on the returned context. Share a manager
//! across threads behind the host's own lock, single writer at a time.

mod compiler;
mod context;
mod error;
mod manager;
mod matcher;
pub mod priority;
mod queue;
mod registry;
mod sandbox;
mod scheduler;

pub use compiler::{ChainCompiler, CompiledChain};
pub use context::{Arguments, HookContext, ImmutableHookContext};
pub use error::HookError;
pub use manager::{HookManager, LogSink};
pub use queue::{MemorySink, QueueSink, QueuedJob};
pub use registry::{FilterCallback, HookCallback, HookOptions};
pub use sandbox::{Sandbox, SandboxLimits};
pub use scheduler::{Task, TaskHandle, TaskScheduler, ThreadScheduler};
