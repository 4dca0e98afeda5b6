//! Callback storage, keyed by channel name and priority.
//!
//! Both hooks and filters live in `channel name → priority → callbacks`
//! structures. Within a channel, iterating priorities ascending and
//! callbacks in registration order yields the full execution order.
//! There is no uniqueness constraint: the same callback registered twice
//! runs twice. Entries are never removed individually; only a full
//! `reset` clears a table.
//!
//! Hook channels are kept in registration order so that pattern-source
//! iteration during matching is deterministic (see the tie-break rules in
//! the matcher module). Filters are only ever resolved by exact name, so
//! a plain map suffices there.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde_json::Value;

use crate::context::HookContext;
use crate::matcher::ChannelPattern;

/// A hook listener callback.
///
/// Listeners run for their side effects, mutating the shared context in
/// place. `Arc` so that detached listeners can cross a thread boundary.
pub type HookCallback = Arc<dyn Fn(&mut HookContext) + Send + Sync>;

/// A filter callback.
///
/// Filters run for their return value: each receives the current value
/// plus the caller's extra arguments, and returns the next value. The
/// extras are the same for every callback in a chain; they do not evolve.
pub type FilterCallback = Arc<dyn Fn(Value, &[Value]) -> Value + Send + Sync>;

/// Registration markers for a hook listener.
///
/// These replace out-of-band attribute scanning: whoever enumerates
/// listeners states the markers explicitly when registering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookOptions {
    /// Do not run the listener at all; forward `(channel, arguments)` to
    /// the configured queue sink instead. Registration fails if no sink
    /// is configured.
    pub background: bool,
    /// Run the listener on the task scheduler with a snapshot of the
    /// context; dispatch does not wait for it.
    pub detached: bool,
}

impl HookOptions {
    /// Marker set for a background-delegated hook.
    pub fn background() -> Self {
        Self {
            background: true,
            ..Self::default()
        }
    }

    /// Marker set for a detached hook.
    pub fn detached() -> Self {
        Self {
            detached: true,
            ..Self::default()
        }
    }
}

/// One registered listener: the callback plus its markers.
#[derive(Clone)]
pub(crate) struct Listener {
    pub callback: HookCallback,
    pub options: HookOptions,
}

/// A hook channel: its name, its pre-classified pattern, and the
/// priority-ordered callback buckets.
pub(crate) struct HookChannel {
    pub name: String,
    pub pattern: ChannelPattern,
    pub buckets: BTreeMap<i32, Vec<Listener>>,
}

/// Hook listener storage, in channel registration order.
#[derive(Default)]
pub(crate) struct HookTable {
    channels: Vec<HookChannel>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener to the bucket at `priority` under `channel`,
    /// creating the channel (classifying its pattern once) and the bucket
    /// as needed.
    pub fn insert(&mut self, channel: &str, priority: i32, listener: Listener) {
        let idx = match self.channels.iter().position(|c| c.name == channel) {
            Some(idx) => idx,
            None => {
                self.channels.push(HookChannel {
                    name: channel.to_string(),
                    pattern: ChannelPattern::classify(channel),
                    buckets: BTreeMap::new(),
                });
                self.channels.len() - 1
            }
        };
        self.channels[idx]
            .buckets
            .entry(priority)
            .or_default()
            .push(listener);
    }

    /// Channels in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &HookChannel> {
        self.channels.iter()
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

/// Filter storage. Exact-name resolution only.
#[derive(Default)]
pub(crate) struct FilterTable {
    channels: HashMap<String, BTreeMap<i32, Vec<FilterCallback>>>,
}

impl FilterTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter to the bucket at `priority` under `channel`.
    pub fn insert(&mut self, channel: &str, priority: i32, callback: FilterCallback) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .entry(priority)
            .or_default()
            .push(callback);
    }

    /// The filter chain for a channel, priority-ascending then
    /// registration-ordered. Empty if nothing is registered.
    pub fn chain(&self, channel: &str) -> Vec<&FilterCallback> {
        match self.channels.get(channel) {
            Some(buckets) => buckets.values().flatten().collect(),
            None => Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }
}
