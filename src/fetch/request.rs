//! HTTP fetcher.
//!
//! Issues one GET per hop with redirects disabled and reports the redirect
//! target the response announces, if any.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::header::{HeaderValue, LOCATION, USER_AGENT};
use reqwest::Url;

use crate::config::MAX_RESPONSE_BODY_SIZE;
use crate::error_handling::FetchError;

/// Body and redirect target of one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Decoded body; `None` when it was too large to read
    pub content: Option<String>,
    /// Absolute redirect target from a 3xx `Location` header
    pub redirect_url: Option<String>,
}

/// Performs a single request.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` once, without following redirects.
    ///
    /// # Errors
    ///
    /// Any connection, protocol, timeout or URL error.
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<FetchResponse, FetchError>;
}

/// `reqwest`-backed fetcher.
///
/// The client must have redirects disabled (see
/// [`init_redirect_client`](crate::initialization::init_redirect_client)).
#[derive(Clone)]
pub struct HttpFetcher {
    client: Arc<reqwest::Client>,
}

impl HttpFetcher {
    pub fn new(client: Arc<reqwest::Client>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<FetchResponse, FetchError> {
        let parsed = Url::parse(url)?;

        let mut request = self.client.get(parsed.clone()).timeout(timeout);
        if let Some(user_agent) = user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        let resp = request.send().await?;

        let status = resp.status();
        let redirect_url = if status.is_redirection() {
            match resp.headers().get(LOCATION) {
                Some(location) => Some(resolve_location(&parsed, location)),
                None => {
                    warn!(
                        "Redirect status {} for {} but no Location header",
                        status.as_u16(),
                        url
                    );
                    None
                }
            }
        } else {
            None
        };

        let content = match resp.content_length() {
            Some(len) if len > MAX_RESPONSE_BODY_SIZE => {
                warn!("Skipping body of {} ({} bytes)", url, len);
                None
            }
            _ => read_capped_body(url, resp).await?,
        };

        debug!(
            "Fetched {} -> {} (redirect: {:?})",
            url,
            status.as_u16(),
            redirect_url
        );

        Ok(FetchResponse {
            status: status.as_u16(),
            content,
            redirect_url,
        })
    }
}

/// Reads the body in chunks, giving up once it grows past the size cap.
///
/// Covers bodies sent without a `Content-Length` (chunked transfer).
async fn read_capped_body(
    url: &str,
    mut resp: reqwest::Response,
) -> Result<Option<String>, FetchError> {
    let mut body = Vec::new();
    while let Some(chunk) = resp.chunk().await? {
        if (body.len() + chunk.len()) as u64 > MAX_RESPONSE_BODY_SIZE {
            warn!(
                "Skipping body of {} (over {} bytes)",
                url, MAX_RESPONSE_BODY_SIZE
            );
            return Ok(None);
        }
        body.extend_from_slice(&chunk);
    }
    Ok(Some(String::from_utf8_lossy(&body).into_owned()))
}

/// Turns a `Location` header into an absolute URL relative to `base`.
///
/// A target that can be neither parsed nor joined is returned as sent; the
/// normalizer logs it and passes it on.
pub(crate) fn resolve_location(base: &Url, location: &HeaderValue) -> String {
    // Servers do send raw UTF-8 here; the URL parser percent-encodes it
    let location = String::from_utf8_lossy(location.as_bytes());
    let location = location.trim();
    match Url::parse(location).or_else(|_| base.join(location)) {
        Ok(target) => target.to_string(),
        Err(e) => {
            warn!("Passing on unparsable Location {:?}: {}", location, e);
            location.to_string()
        }
    }
}
