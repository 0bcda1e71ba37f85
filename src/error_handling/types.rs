//! Error type definitions.
//!
//! Fetch and queue errors are recoverable per item: the resolver folds fetch
//! errors into an ERROR hop and the loops log queue errors and move on.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error connecting to the queue service.
    #[error("Queue initialization error: {0}")]
    QueueError(#[from] QueueError),

    /// A configured URL pattern is not a valid regular expression.
    #[error("Invalid URL pattern: {0}")]
    PatternError(#[from] regex::Error),

    /// A worker process could not be started.
    #[error("Worker spawn error: {0}")]
    SpawnError(#[from] std::io::Error),

    /// The configuration could not be handed to a worker.
    #[error("Configuration serialization error: {0}")]
    ConfigError(#[from] serde_json::Error),
}

/// Errors raised while fetching a single URL.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Connection, TLS, timeout or protocol failure.
    #[error("HTTP request error: {0}")]
    Request(#[from] ReqwestError),

    /// The URL to fetch could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Errors reported by a queue client.
///
/// This is the one error type loops catch around take/ack/bury/put.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The queue service could not be reached or rejected a command.
    #[error("Queue connection error: {0}")]
    Connection(#[from] redis::RedisError),

    /// Task data could not be encoded or decoded.
    #[error("Queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The task is not currently taken from this tube.
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// The queue refused the operation for another reason.
    #[error("Queue unavailable: {0}")]
    Unavailable(String),
}
