//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - Logger
//! - HTTP clients (fetcher, callbacks, reachability probe)
//! - Queue tubes
//! - Compiled URL pattern sets

mod client;
mod logger;

use std::sync::Arc;

use crate::config::Config;
use crate::error_handling::InitializationError;
use crate::fetch::UrlPatterns;
use crate::queue::RedisTube;

// Re-export public API
pub use client::{init_callback_client, init_probe_client, init_redirect_client};
pub use logger::init_logger_with;

/// Connects to the named tube in the configured queue namespace.
///
/// # Errors
///
/// Returns `InitializationError::QueueError` if the queue service is unreachable.
pub async fn init_tube(config: &Config, name: &str) -> Result<Arc<RedisTube>, InitializationError> {
    let tube =
        RedisTube::connect(&config.queue_url, config.queue_space, name, config.queue_ttr).await?;
    Ok(Arc::new(tube))
}

/// Compiles the fast-path and ignored-redirect pattern sets.
///
/// # Errors
///
/// Returns `InitializationError::PatternError` for an invalid regular expression.
pub fn init_url_patterns(
    config: &Config,
) -> Result<(UrlPatterns, UrlPatterns), InitializationError> {
    let skip = UrlPatterns::new(&config.skip_url_patterns)?;
    let ignored = UrlPatterns::new(&config.ignored_redirect_patterns)?;
    Ok((skip, ignored))
}
