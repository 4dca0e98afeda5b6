//! Channel name matching and callback resolution.
//!
//! Three channel syntaxes are recognized at registration time:
//!
//! - **Literal**: plain names like `user.created`, matched by exact
//!   equality only.
//! - **Wildcard**: names containing `*`, like `user.*`. Translated to an
//!   anchored regex where `*` matches any sequence (including empty) and
//!   every other character is taken literally.
//! - **Regex**: names starting with a delimiter character (`#` or `/`),
//!   like `#^order\.(created|updated)$#`. The delimited body is used as a
//!   regex and tested, unanchored, against the dispatched name.
//!
//! Patterns are classified and compiled once, when the channel is first
//! registered. A malformed regex is the registrant's problem: it never
//! matches anything, and there is no error path.
//!
//! # Resolution order
//!
//! Resolving a dispatched name `N` merges the exact-match channel with
//! every pattern channel that matches `N`, then stable-sorts the merged
//! entries by priority. The stable sort fixes the tie-break at equal
//! priority: the exact-match source precedes pattern sources, and pattern
//! sources keep their channel registration order. Within one bucket,
//! registration order is always preserved.

use regex::Regex;

use crate::registry::{HookCallback, HookOptions, HookTable};

/// A channel name's matching behavior, decided at registration time.
pub(crate) enum ChannelPattern {
    /// Exact equality only.
    Literal,
    /// Compiled wildcard or regex pattern. `None` means the pattern was
    /// malformed and never matches.
    Pattern(Option<Regex>),
}

/// Characters recognized as regex delimiters at the start of a name.
const REGEX_DELIMITERS: [char; 2] = ['#', '/'];

impl ChannelPattern {
    /// Classifies a channel name and compiles its pattern if it has one.
    pub fn classify(name: &str) -> Self {
        if let Some(delimiter) = name.chars().next().filter(|c| REGEX_DELIMITERS.contains(c)) {
            let body = name[delimiter.len_utf8()..].trim_end_matches(delimiter);
            return Self::Pattern(Regex::new(body).ok());
        }
        if name.contains('*') {
            let translated = format!(
                "^{}$",
                name.split('*')
                    .map(regex::escape)
                    .collect::<Vec<_>>()
                    .join(".*")
            );
            return Self::Pattern(Regex::new(&translated).ok());
        }
        Self::Literal
    }

    /// Tests a dispatched name against this pattern. Literal channels
    /// never match here; they are handled by exact lookup.
    pub fn matches(&self, dispatched: &str) -> bool {
        match self {
            Self::Literal => false,
            Self::Pattern(Some(regex)) => regex.is_match(dispatched),
            Self::Pattern(None) => false,
        }
    }
}

/// One callback resolved for execution, with the metadata the dispatcher
/// needs to run or delegate it.
#[derive(Clone)]
pub(crate) struct ResolvedHook {
    pub priority: i32,
    pub callback: HookCallback,
    pub options: HookOptions,
}

/// Resolves the ordered callback list for a dispatched channel name.
///
/// The channel registered under `name` itself (pattern-shaped or not)
/// contributes via the exact lookup and is excluded from the pattern
/// scan, so its callbacks never run twice.
pub(crate) fn resolve(table: &HookTable, name: &str) -> Vec<ResolvedHook> {
    let mut resolved = Vec::new();

    for channel in table.iter() {
        let matched = if channel.name == name {
            true
        } else {
            channel.pattern.matches(name)
        };
        if !matched {
            continue;
        }
        // Exact match first so the stable sort below keeps it ahead of
        // pattern sources at equal priority.
        let position = if channel.name == name {
            0
        } else {
            resolved.len()
        };
        let mut entries = Vec::new();
        for (&priority, bucket) in &channel.buckets {
            for listener in bucket {
                entries.push(ResolvedHook {
                    priority,
                    callback: listener.callback.clone(),
                    options: listener.options,
                });
            }
        }
        resolved.splice(position..position, entries);
    }

    resolved.sort_by_key(|entry| entry.priority);
    resolved
}
