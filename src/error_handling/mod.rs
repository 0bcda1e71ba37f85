//! Error handling.
//!
//! This module provides the error types shared across the crate:
//! - **Initialization**: logger, HTTP client, queue connection, URL patterns
//! - **Fetch**: single-request failures, classified as ERROR hops by the resolver
//! - **Queue**: queue-client failures, logged per item by the worker loops

mod types;

// Re-export public API
pub use types::{FetchError, InitializationError, QueueError};
