//! HTTP client initialization.
//!
//! Timeouts and User-Agent are applied per request so one client serves every
//! configured timeout; the builders here only fix the redirect policy and TLS.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Config;

/// Initializes the client used by the fetcher.
///
/// Redirects are disabled so each hop is observed and classified separately.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_redirect_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(config.http_timeout)
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the client used for notification callbacks.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_callback_client(config: &Config) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(config.http_connection_timeout)
        .danger_accept_invalid_certs(config.callback_accept_invalid_certs)
        .build()?;
    Ok(Arc::new(client))
}

/// Initializes the client used by the network reachability probe.
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_probe_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new().timeout(timeout).build()
}
