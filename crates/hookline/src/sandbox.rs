//! Opt-in failure containment around single callback invocations.
//!
//! The default dispatch path does **not** sandbox: a panicking listener
//! unwinds into the dispatch caller. Call sites that must survive
//! misbehaving listeners route them through [`Sandbox`]: a panic is
//! caught, reported to the error log, and the chain proceeds as if the
//! callback had simply returned.
//!
//! Resource limits are soft. The callback is never interrupted; after it
//! returns, the observed wall-clock duration and memory delta are checked
//! against the configured limits and overruns are logged as warnings.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::{error, warn};

use crate::context::HookContext;
use crate::registry::{FilterCallback, HookCallback};

/// Soft limits observed (never enforced) by [`Sandbox::execute`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SandboxLimits {
    time: Option<Duration>,
    memory: Option<u64>,
}

impl SandboxLimits {
    /// No limits: failure containment only.
    pub fn none() -> Self {
        Self::default()
    }

    /// Warn if the callback ran longer than `limit`.
    pub fn with_time(mut self, limit: Duration) -> Self {
        self.time = Some(limit);
        self
    }

    /// Warn if the callback grew resident memory by more than `bytes`.
    ///
    /// Memory observation reads the process RSS and is best-effort: on
    /// platforms where it is unavailable the check is skipped.
    pub fn with_memory(mut self, bytes: u64) -> Self {
        self.memory = Some(bytes);
        self
    }
}

/// Safe execution environment for hook and filter callbacks.
#[derive(Debug, Default)]
pub struct Sandbox;

impl Sandbox {
    /// Creates a sandbox.
    pub fn new() -> Self {
        Self
    }

    /// Invokes a hook callback inside a failure boundary.
    ///
    /// A panic is caught and logged; the caller observes it only as "this
    /// callback did nothing". Limit overruns are logged after the fact.
    pub fn execute(&self, callback: &HookCallback, context: &mut HookContext, limits: SandboxLimits) {
        let channel = context.hook_name().to_string();
        let memory_before = current_rss();
        let started = Instant::now();

        let outcome = catch_unwind(AssertUnwindSafe(|| callback(context)));
        if let Err(payload) = outcome {
            error!(
                channel = %channel,
                "Hook execution failed: {}",
                panic_message(payload.as_ref())
            );
            return;
        }

        if let Some(limit) = limits.time {
            let elapsed = started.elapsed();
            if elapsed > limit {
                warn!(
                    channel = %channel,
                    "Hook execution exceeded time limit: {:?} > {:?}",
                    elapsed,
                    limit
                );
            }
        }

        if let Some(limit) = limits.memory {
            if let (Some(before), Some(after)) = (memory_before, current_rss()) {
                let delta = after.saturating_sub(before);
                if delta > limit {
                    warn!(
                        channel = %channel,
                        "Hook execution exceeded memory limit: {} bytes > {} bytes",
                        delta,
                        limit
                    );
                }
            }
        }
    }

    /// Invokes a filter callback inside a failure boundary.
    ///
    /// On panic, the original value is returned unchanged — the failed
    /// filter contributes no transform to the chain.
    pub fn execute_safe(&self, callback: &FilterCallback, value: Value, extras: &[Value]) -> Value {
        let original = value.clone();
        match catch_unwind(AssertUnwindSafe(|| callback(value, extras))) {
            Ok(filtered) => filtered,
            Err(payload) => {
                error!("Filter execution failed: {}", panic_message(payload.as_ref()));
                original
            }
        }
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "unknown panic"
    }
}

/// Resident set size of the current process, if the platform exposes it.
#[cfg(target_os = "linux")]
fn current_rss() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    let line = status.lines().find(|line| line.starts_with("VmRSS:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(not(target_os = "linux"))]
fn current_rss() -> Option<u64> {
    None
}
