//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (timeouts, pool sizes, URL pattern defaults)
//! - The library `Config`
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Command, Config, LogFormat, LogLevel, Opt};
