//! URL normalization.
//!
//! Converts URLs to a transport-safe form (IDNA hosts, percent-encoded paths)
//! and rewrites vendor market URIs to web URLs.

use log::{debug, warn};
use url::Url;

use crate::config::{MARKET_SCHEME, PREFIX_GOOGLE_MARKET};

/// Normalizes a URL for transport.
///
/// Hosts are IDNA-encoded and path/query are percent-encoded. Never fails:
/// a URL that cannot be encoded is logged and returned unchanged. `None`
/// passes through as `None`.
///
/// # Examples
///
/// ```
/// use redirect_checker::fetch::prepare_url;
///
/// assert_eq!(prepare_url(None), None);
/// assert_eq!(
///     prepare_url(Some("http://пример.рф/")).as_deref(),
///     Some("http://xn--e1afmkfd.xn--p1ai/")
/// );
/// ```
pub fn prepare_url(url: Option<&str>) -> Option<String> {
    let url = url?;
    match Url::parse(url) {
        Ok(parsed) => Some(parsed.to_string()),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            debug!("Leaving relative URL as is: {}", url);
            Some(url.to_string())
        }
        Err(e) => {
            warn!("Failed to normalize URL {}: {}", url, e);
            Some(url.to_string())
        }
    }
}

/// Returns true for `market://` URIs (scheme compared case-insensitively).
pub fn is_market_url(url: &str) -> bool {
    url.get(..MARKET_SCHEME.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(MARKET_SCHEME))
}

/// Rewrites a `market://` URI to the equivalent store web URL.
///
/// Path and query are kept as they are. Callers check [`is_market_url`] first.
pub fn fix_market_url(url: &str) -> String {
    let rest = if is_market_url(url) {
        &url[MARKET_SCHEME.len()..]
    } else {
        url
    };
    format!("{}{}", PREFIX_GOOGLE_MARKET, rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_none_url() {
        assert_eq!(prepare_url(None), None);
    }

    #[test]
    fn test_prepare_url_encodes_idna_host_and_path() {
        let prepared = prepare_url(Some("http://пример.рф/путь?q=тест")).unwrap();
        assert!(prepared.starts_with("http://xn--e1afmkfd.xn--p1ai/"));
        assert!(prepared.is_ascii());
    }

    #[test]
    fn test_prepare_url_keeps_ascii_url() {
        assert_eq!(
            prepare_url(Some("https://example.com/a?b=c")).as_deref(),
            Some("https://example.com/a?b=c")
        );
    }

    #[test]
    fn test_prepare_url_with_unencodable_host_returns_input() {
        // Forbidden host code point; encoding fails, the input comes back
        let bad = "http://exa mple.com/";
        assert_eq!(prepare_url(Some(bad)).as_deref(), Some(bad));
    }

    #[test]
    fn test_prepare_url_relative_returns_input() {
        assert_eq!(prepare_url(Some("url")).as_deref(), Some("url"));
    }

    #[test]
    fn test_fix_market_url() {
        let market = "details?id=12345";
        assert_eq!(
            fix_market_url(&format!("market://{}", market)),
            format!("{}{}", PREFIX_GOOGLE_MARKET, market)
        );
    }

    #[test]
    fn test_is_market_url() {
        assert!(is_market_url("market://details?id=1"));
        assert!(is_market_url("MARKET://details?id=1"));
        assert!(!is_market_url("https://play.google.com/"));
        assert!(!is_market_url("mark"));
        assert!(!is_market_url(""));
    }
}
