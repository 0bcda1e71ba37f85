//! Redirect resolution.
//!
//! [`Resolver`] classifies a single hop; [`get_redirect_history`] walks hops
//! until the chain is resolved, a hop fails, or the hop bound is reached.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error};
use regex::RegexSet;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};

use crate::config::{Config, DEFAULT_HTTP_TIMEOUT, MAX_REDIRECT_HOPS};
use crate::fetch::normalize::{fix_market_url, is_market_url, prepare_url};
use crate::fetch::request::Fetcher;
use crate::parse::{check_for_meta, get_counters};

/// How a hop moved on to its target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr, EnumIter,
)]
pub enum RedirectType {
    /// 3xx response with a Location header
    #[serde(rename = "http_status")]
    #[strum(serialize = "http_status")]
    Http,
    /// `<meta http-equiv="refresh">` in the body
    #[serde(rename = "meta_tag")]
    #[strum(serialize = "meta_tag")]
    Meta,
    /// The fetch itself failed
    #[serde(rename = "ERROR")]
    #[strum(serialize = "ERROR")]
    Error,
}

/// Classified step to the next URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub kind: RedirectType,
    pub target: String,
}

/// Result of resolving one URL.
///
/// `redirect` is `None` when the URL is fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectHop {
    /// URL that was fetched
    pub url: String,
    pub redirect: Option<Redirect>,
    /// Body returned for `url`, if any
    pub content: Option<String>,
}

impl RedirectHop {
    pub fn redirect_type(&self) -> Option<RedirectType> {
        self.redirect.as_ref().map(|r| r.kind)
    }

    pub fn target_url(&self) -> Option<&str> {
        self.redirect.as_ref().map(|r| r.target.as_str())
    }
}

/// Set of URL regexes, matched anywhere in the URL.
#[derive(Debug, Clone)]
pub struct UrlPatterns(RegexSet);

impl UrlPatterns {
    /// Compiles `patterns`.
    ///
    /// # Errors
    ///
    /// Returns the regex error for the first invalid pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self(RegexSet::new(patterns)?))
    }

    pub fn empty() -> Self {
        Self(RegexSet::empty())
    }

    pub fn matches(&self, url: &str) -> bool {
        self.0.is_match(url)
    }
}

impl Default for UrlPatterns {
    fn default() -> Self {
        Self::empty()
    }
}

/// One-hop resolution.
#[async_trait]
pub trait ResolveHop: Send + Sync {
    /// Resolves `url` one step. Never fails: fetch errors become ERROR hops.
    async fn resolve(&self, url: &str, timeout: Duration, user_agent: Option<&str>) -> RedirectHop;
}

/// Resolver built on a [`Fetcher`].
pub struct Resolver<F> {
    fetcher: F,
    ignored_redirects: UrlPatterns,
}

impl<F: Fetcher> Resolver<F> {
    /// `ignored_redirects` lists HTTP redirect targets that count as "resolved".
    pub fn new(fetcher: F, ignored_redirects: UrlPatterns) -> Self {
        Self {
            fetcher,
            ignored_redirects,
        }
    }
}

#[async_trait]
impl<F: Fetcher> ResolveHop for Resolver<F> {
    async fn resolve(&self, url: &str, timeout: Duration, user_agent: Option<&str>) -> RedirectHop {
        let response = match self.fetcher.fetch(url, timeout, user_agent).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to fetch {}: {}", url, e);
                return RedirectHop {
                    url: url.to_string(),
                    redirect: Some(Redirect {
                        kind: RedirectType::Error,
                        target: url.to_string(),
                    }),
                    content: None,
                };
            }
        };

        let content = response.content;

        let (kind, target) = match response.redirect_url {
            Some(target) if self.ignored_redirects.matches(&target) => {
                debug!("Ignoring redirect {} -> {}", url, target);
                (None, None)
            }
            Some(target) => (Some(RedirectType::Http), Some(target)),
            None => match content.as_deref().and_then(|c| check_for_meta(c, url)) {
                Some(target) => (Some(RedirectType::Meta), Some(target)),
                None => (None, None),
            },
        };

        let target = target.map(|t| if is_market_url(&t) { fix_market_url(&t) } else { t });
        let redirect = match (kind, prepare_url(target.as_deref())) {
            (Some(kind), Some(target)) => Some(Redirect { kind, target }),
            _ => None,
        };

        RedirectHop {
            url: url.to_string(),
            redirect,
            content,
        }
    }
}

/// Full record of one walk.
///
/// `urls` starts with the input URL and always holds one more entry than
/// `types`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHistory {
    pub types: Vec<RedirectType>,
    pub urls: Vec<String>,
    pub counters: Vec<String>,
}

impl RedirectHistory {
    fn start(url: &str) -> Self {
        Self {
            urls: vec![url.to_string()],
            ..Default::default()
        }
    }

    /// True when some hop failed to fetch.
    pub fn has_error(&self) -> bool {
        self.types.contains(&RedirectType::Error)
    }

    /// The last URL reached.
    pub fn final_url(&self) -> Option<&str> {
        self.urls.last().map(String::as_str)
    }

    /// `[types, urls, counters]` as written to the result tube.
    pub fn to_result(&self) -> serde_json::Value {
        serde_json::json!([self.types, self.urls, self.counters])
    }
}

/// Walk parameters.
#[derive(Debug, Clone)]
pub struct WalkOptions {
    pub timeout: Duration,
    pub user_agent: Option<String>,
    /// Upper bound on recorded hops; breaks redirect cycles
    pub max_redirects: usize,
    /// URLs that are never walked
    pub skip: UrlPatterns,
}

impl WalkOptions {
    pub fn from_config(config: &Config, skip: UrlPatterns) -> Self {
        Self {
            timeout: config.http_timeout,
            user_agent: config.user_agent.clone(),
            max_redirects: config.max_redirects,
            skip,
        }
    }
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_HTTP_TIMEOUT,
            user_agent: None,
            max_redirects: MAX_REDIRECT_HOPS,
            skip: UrlPatterns::empty(),
        }
    }
}

/// Walks the redirect chain starting at `url`.
///
/// Stops when a hop has no redirect (resolved), right after recording an
/// ERROR hop, or after `max_redirects` hops. Counters from every fetched body
/// are collected along the way. URLs matching `options.skip` return at once
/// with only the input URL recorded.
pub async fn get_redirect_history<R>(resolver: &R, url: &str, options: &WalkOptions) -> RedirectHistory
where
    R: ResolveHop + ?Sized,
{
    let mut history = RedirectHistory::start(url);
    if options.skip.matches(url) {
        debug!("Skipping walk for {}", url);
        return history;
    }

    let mut current = url.to_string();
    for _ in 0..options.max_redirects {
        let hop = resolver
            .resolve(&current, options.timeout, options.user_agent.as_deref())
            .await;

        if let Some(content) = hop.content.as_deref() {
            history.counters.extend(get_counters(content));
        }

        let Some(Redirect { kind, target }) = hop.redirect else {
            break;
        };
        history.types.push(kind);
        history.urls.push(target.clone());

        if kind == RedirectType::Error {
            break;
        }
        current = target;
    }

    debug!(
        "Resolved {} in {} hop(s) to {:?}",
        url,
        history.types.len(),
        history.final_url()
    );
    history
}
