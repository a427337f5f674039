//! Global configuration for hspkit runtime behavior.
//!
//! This module provides thread-safe global configuration that affects
//! how rows are grouped into records without adding overhead to hot loops.

use std::sync::atomic::{AtomicBool, Ordering};

/// Global flag for strict grouping.
///
/// Records are formed from contiguous runs of rows. By default a query or
/// subject id that re-appears after its run was closed silently starts a new
/// record or hit. When strict grouping is enabled the reader reports such
/// input as an error instead.
///
/// This is set once at startup and read when a reader is constructed.
static STRICT_GROUPING: AtomicBool = AtomicBool::new(false);

/// Enable or disable strict grouping for every reader created afterwards.
///
/// # Example
///
/// ```
/// use hspkit::config;
///
/// // Enable at startup before any reading
/// config::set_strict_grouping(true);
/// assert!(config::is_strict_grouping());
/// # config::set_strict_grouping(false);
/// ```
#[inline]
pub fn set_strict_grouping(enabled: bool) {
    STRICT_GROUPING.store(enabled, Ordering::Release);
}

/// Check if strict grouping is enabled.
#[inline]
pub fn is_strict_grouping() -> bool {
    STRICT_GROUPING.load(Ordering::Acquire)
}
