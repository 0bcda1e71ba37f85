//! Page content inspection.
//!
//! - Meta-refresh redirect detection
//! - Tracking counter signature detection

mod counters;
mod meta;

use regex::Regex;
use scraper::Selector;

pub use counters::{get_counters, COUNTER_TYPES};
pub use meta::check_for_meta;

/// Compiles a static regex, panicking with context if the pattern is invalid.
///
/// Only for compile-time constant patterns; a failure is a programming error.
pub(crate) fn compile_regex_unsafe(pattern: &str, context: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| {
        panic!(
            "Failed to compile regex pattern '{}' in {}: {}. This is a programming error.",
            pattern, context, e
        )
    })
}

/// Parses a static CSS selector, panicking with context if it is invalid.
pub(crate) fn parse_selector_unsafe(selector_str: &str, context: &str) -> Selector {
    Selector::parse(selector_str).unwrap_or_else(|e| {
        panic!(
            "Failed to parse CSS selector '{}' in {}: {}. This is a programming error.",
            selector_str, context, e
        )
    })
}
