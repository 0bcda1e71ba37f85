//! redirect_checker library: redirect-chain resolution and notification delivery
//!
//! This library resolves the full redirect chain of a URL (HTTP `Location`
//! redirects and HTML meta refresh), records the tracking counters seen on the
//! way, and runs the queue-driven services around it: a supervised pool of
//! redirect-check worker processes and a notification pusher.
//!
//! # Example
//!
//! ```no_run
//! use redirect_checker::fetch::{get_redirect_history, HttpFetcher, Resolver, UrlPatterns, WalkOptions};
//! use redirect_checker::initialization::init_redirect_client;
//! use redirect_checker::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let client = init_redirect_client(&config)?;
//! let resolver = Resolver::new(HttpFetcher::new(client), UrlPatterns::empty());
//!
//! let history = get_redirect_history(&resolver, "http://example.com/", &WalkOptions::default()).await;
//! println!("{:?} -> {:?}", history.types, history.final_url());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod app;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod initialization;
pub mod notification;
pub mod parse;
pub mod queue;
pub mod supervisor;
pub mod worker;

// Re-export public API
pub use app::Shutdown;
pub use config::{Command, Config, LogFormat, LogLevel, Opt};
pub use error_handling::{FetchError, InitializationError, QueueError};
pub use fetch::{get_redirect_history, RedirectHistory, RedirectType};
pub use notification::run_notification_pusher;
pub use supervisor::run_redirect_checker;
pub use worker::run_worker;
