//! Configuration types and CLI options.
//!
//! This module defines the library `Config` and the `clap` options the binary
//! turns into one.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::config::constants::*;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration.
///
/// Read-only inputs for the resolver, the worker supervisor and the
/// notification pusher. Serializable so the supervisor can hand it to the
/// worker processes it spawns.
///
/// # Examples
///
/// ```no_run
/// use redirect_checker::Config;
/// use std::time::Duration;
///
/// let config = Config {
///     worker_pool_size: 4,
///     http_timeout: Duration::from_secs(5),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Queue service endpoint
    pub queue_url: String,

    /// Namespace the tube keys live under
    pub queue_space: u32,

    /// Tube redirect-check tasks are taken from
    pub input_tube: String,

    /// Tube redirect-check results are written to
    pub output_tube: String,

    /// Tube the notification pusher drains
    pub notification_tube: String,

    /// Bounded wait for a single take
    pub queue_take_timeout: Duration,

    /// Unfinished taken tasks are delivered again after this long
    pub queue_ttr: Duration,

    /// Per-hop fetch timeout
    pub http_timeout: Duration,

    /// Callback POST timeout
    pub http_connection_timeout: Duration,

    /// Upper bound on recorded hops per walk
    pub max_redirects: usize,

    /// User-Agent header for fetches (reqwest default when unset)
    pub user_agent: Option<String>,

    /// Worker processes (redirect checker) or in-flight dispatches (pusher)
    pub worker_pool_size: usize,

    /// Interval between supervisor ticks and dispatch loop iterations
    pub sleep: Duration,

    /// Pause before a failed top-level loop is restarted
    pub sleep_on_fail: Duration,

    /// Reachability probe target
    pub check_url: String,

    /// Delay before a task that hit an ERROR hop is rechecked
    pub recheck_delay: Duration,

    /// URLs matching any of these are never walked
    pub skip_url_patterns: Vec<String>,

    /// HTTP redirect targets matching any of these end the walk
    pub ignored_redirect_patterns: Vec<String>,

    /// Skip TLS certificate verification for notification callbacks
    pub callback_accept_invalid_certs: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            queue_url: DEFAULT_QUEUE_URL.to_string(),
            queue_space: DEFAULT_QUEUE_SPACE,
            input_tube: DEFAULT_INPUT_TUBE.to_string(),
            output_tube: DEFAULT_OUTPUT_TUBE.to_string(),
            notification_tube: DEFAULT_NOTIFICATION_TUBE.to_string(),
            queue_take_timeout: DEFAULT_QUEUE_TAKE_TIMEOUT,
            queue_ttr: DEFAULT_QUEUE_TTR,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            http_connection_timeout: DEFAULT_HTTP_CONNECTION_TIMEOUT,
            max_redirects: MAX_REDIRECT_HOPS,
            user_agent: None,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            sleep: DEFAULT_SLEEP,
            sleep_on_fail: DEFAULT_SLEEP_ON_FAIL,
            check_url: DEFAULT_CHECK_URL.to_string(),
            recheck_delay: DEFAULT_RECHECK_DELAY,
            skip_url_patterns: DEFAULT_SKIP_URL_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            ignored_redirect_patterns: DEFAULT_IGNORED_REDIRECT_PATTERNS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            callback_accept_invalid_certs: false,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Supervise a pool of 20 redirect-check workers
/// redirect_checker --worker-pool-size 20 redirect-checker
///
/// # Push notifications with JSON logs
/// redirect_checker --log-format json notification-pusher
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "redirect_checker",
    about = "Resolves URL redirect chains from a task queue and pushes notifications."
)]
pub struct Opt {
    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info, global = true)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain, global = true)]
    pub log_format: LogFormat,

    /// Queue service URL
    #[arg(long, env = "REDIRECT_CHECKER_QUEUE_URL", default_value = DEFAULT_QUEUE_URL)]
    pub queue_url: String,

    /// Queue namespace
    #[arg(long, env = "REDIRECT_CHECKER_QUEUE_SPACE", default_value_t = DEFAULT_QUEUE_SPACE)]
    pub queue_space: u32,

    /// Tube with redirect-check tasks
    #[arg(long, env = "REDIRECT_CHECKER_INPUT_TUBE", default_value = DEFAULT_INPUT_TUBE)]
    pub input_tube: String,

    /// Tube receiving redirect-check results
    #[arg(long, env = "REDIRECT_CHECKER_OUTPUT_TUBE", default_value = DEFAULT_OUTPUT_TUBE)]
    pub output_tube: String,

    /// Tube with notification tasks
    #[arg(long, env = "REDIRECT_CHECKER_NOTIFICATION_TUBE", default_value = DEFAULT_NOTIFICATION_TUBE)]
    pub notification_tube: String,

    /// Number of workers (processes or in-flight notifications)
    #[arg(long, env = "REDIRECT_CHECKER_WORKER_POOL_SIZE", default_value_t = DEFAULT_WORKER_POOL_SIZE)]
    pub worker_pool_size: usize,

    /// Per-hop HTTP timeout in seconds
    #[arg(long, env = "REDIRECT_CHECKER_HTTP_TIMEOUT", default_value_t = DEFAULT_HTTP_TIMEOUT.as_secs())]
    pub http_timeout_seconds: u64,

    /// Maximum recorded redirect hops
    #[arg(long, env = "REDIRECT_CHECKER_MAX_REDIRECTS", default_value_t = MAX_REDIRECT_HOPS)]
    pub max_redirects: usize,

    /// Loop interval in seconds
    #[arg(long, env = "REDIRECT_CHECKER_SLEEP", default_value_t = DEFAULT_SLEEP.as_secs())]
    pub sleep_seconds: u64,

    /// Reachability check URL
    #[arg(long, env = "REDIRECT_CHECKER_CHECK_URL", default_value = DEFAULT_CHECK_URL)]
    pub check_url: String,

    /// HTTP User-Agent header value
    #[arg(long, env = "REDIRECT_CHECKER_USER_AGENT")]
    pub user_agent: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Which long-running process to start.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Supervise the redirect-check worker processes
    RedirectChecker,
    /// Run one redirect-check worker (spawned by the supervisor)
    Worker {
        /// Supervisor process id; the worker exits once it is gone
        #[arg(long)]
        parent_pid: u32,
    },
    /// Drain the notification tube and post callbacks
    NotificationPusher,
}

impl Opt {
    /// Builds the library configuration from the parsed options.
    pub fn to_config(&self) -> Config {
        Config {
            queue_url: self.queue_url.clone(),
            queue_space: self.queue_space,
            input_tube: self.input_tube.clone(),
            output_tube: self.output_tube.clone(),
            notification_tube: self.notification_tube.clone(),
            worker_pool_size: self.worker_pool_size,
            http_timeout: Duration::from_secs(self.http_timeout_seconds),
            max_redirects: self.max_redirects,
            sleep: Duration::from_secs(self.sleep_seconds),
            check_url: self.check_url.clone(),
            user_agent: self.user_agent.clone(),
            ..Default::default()
        }
    }
}
