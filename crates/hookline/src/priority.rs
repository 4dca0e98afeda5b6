//! Named priority constants.
//!
//! Priorities are plain `i32` values; lower numbers run earlier. These
//! constants cover the common cases, but any integer (including negative
//! values) is accepted by the registration API.

/// Runs first.
pub const HIGHEST: i32 = 0;

/// Runs before normal listeners.
pub const HIGH: i32 = 5;

/// The default priority.
pub const NORMAL: i32 = 10;

/// Runs after normal listeners.
pub const LOW: i32 = 20;

/// Runs last.
pub const LOWEST: i32 = 100;
