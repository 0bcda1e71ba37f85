//! Configuration constants.
//!
//! Defaults for every `Config` field plus the fixed tables the resolver relies on.

use std::time::Duration;

// Queue
pub const DEFAULT_QUEUE_URL: &str = "redis://127.0.0.1:6379";
pub const DEFAULT_QUEUE_SPACE: u32 = 0;
pub const DEFAULT_INPUT_TUBE: &str = "url_check";
pub const DEFAULT_OUTPUT_TUBE: &str = "url_check_result";
pub const DEFAULT_NOTIFICATION_TUBE: &str = "notification";
pub const DEFAULT_QUEUE_TAKE_TIMEOUT: Duration = Duration::from_secs(1);
/// Time a taken task may stay unfinished before the queue delivers it again.
/// Must outlast a full walk (`MAX_REDIRECT_HOPS` * `DEFAULT_HTTP_TIMEOUT`).
pub const DEFAULT_QUEUE_TTR: Duration = Duration::from_secs(300);

// Network operation timeouts
/// Per-hop fetch timeout
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(3);
/// Timeout for notification callback POSTs
pub const DEFAULT_HTTP_CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CHECK_URL: &str = "http://www.google.com/";

// Pool and loop pacing
pub const DEFAULT_WORKER_POOL_SIZE: usize = 10;
pub const DEFAULT_SLEEP: Duration = Duration::from_secs(10);
pub const DEFAULT_SLEEP_ON_FAIL: Duration = Duration::from_secs(10);
pub const DEFAULT_RECHECK_DELAY: Duration = Duration::from_secs(300);

// Redirect handling
/// Maximum number of redirect hops to follow.
/// Breaks redirect cycles; reaching it is not an error.
pub const MAX_REDIRECT_HOPS: usize = 30;

/// Maximum response body size in bytes (2MB).
/// Bodies announced larger than this are not read.
pub const MAX_RESPONSE_BODY_SIZE: u64 = 2 * 1024 * 1024;

/// Web prefix that `market://` URIs are rewritten under.
pub const PREFIX_GOOGLE_MARKET: &str = "https://play.google.com/store/apps/";
pub const MARKET_SCHEME: &str = "market://";

/// URLs that never need resolution; the walk returns immediately.
pub const DEFAULT_SKIP_URL_PATTERNS: &[&str] = &[
    r"^https?://my\.mail\.ru/apps/",
    r"^https?://(www\.)?odnoklassniki\.ru/",
];

/// HTTP redirects that mean "logged-in page", not a real hop.
pub const DEFAULT_IGNORED_REDIRECT_PATTERNS: &[&str] =
    &[r"^https?://(www\.)?odnoklassniki\.ru/.*st\.redirect"];

// Signals
/// Exit code reported after a signal is `SIGNAL_EXIT_CODE_OFFSET + signum`.
pub const SIGNAL_EXIT_CODE_OFFSET: i32 = 128;

/// Environment variable carrying the serialized `Config` into worker processes.
pub const WORKER_CONFIG_ENV: &str = "REDIRECT_CHECKER_WORKER_CONFIG";
