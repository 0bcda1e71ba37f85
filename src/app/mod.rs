//! Process-level plumbing shared by the entry points.

pub mod shutdown;

// Re-export public API
pub use shutdown::{install_signal_handlers, Shutdown, SHUTDOWN_SIGNALS};
