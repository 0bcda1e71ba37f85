// Shared test helpers for building resolvers and task payloads.

use redirect_checker::fetch::{HttpFetcher, Resolver, UrlPatterns};
use redirect_checker::initialization::init_redirect_client;
use redirect_checker::queue::TaskData;
use redirect_checker::Config;

/// Resolver over a real HTTP client with the default ignored redirects.
#[allow(dead_code)] // Used by other test files
pub fn http_resolver() -> Resolver<HttpFetcher> {
    let config = Config::default();
    let client = init_redirect_client(&config).expect("Failed to build HTTP client");
    let ignored = UrlPatterns::new(&config.ignored_redirect_patterns)
        .expect("Default patterns should compile");
    Resolver::new(HttpFetcher::new(client), ignored)
}

/// Turns a JSON object literal into task data.
#[allow(dead_code)] // Used by other test files
pub fn task_data(value: serde_json::Value) -> TaskData {
    value
        .as_object()
        .cloned()
        .expect("Task data must be a JSON object")
}
