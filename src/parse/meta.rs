//! Meta-refresh redirect detection.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use super::{compile_regex_unsafe, parse_selector_unsafe};

static META_REFRESH_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    parse_selector_unsafe("meta[http-equiv][content]", "META_REFRESH_SELECTOR")
});

static REFRESH_URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| compile_regex_unsafe(r"(?is)^\s*url\s*=\s*(.*?)\s*$", "REFRESH_URL_PATTERN"));

/// Extracts the target of a `<meta http-equiv="refresh">` tag.
///
/// Uses the first meta tag whose `http-equiv` is "refresh" (any case) and
/// which carries a `content` attribute. The content must split on `;` into
/// exactly two parts, `delay;url=target`. A relative target is joined onto
/// `base_url` when that parses as an absolute URL.
///
/// Malformed or missing markup yields `None`, never an error.
///
/// # Examples
///
/// ```
/// use redirect_checker::parse::check_for_meta;
///
/// let html = r#"<meta http-equiv="refresh" content="0;url=http://target">"#;
/// assert_eq!(
///     check_for_meta(html, "http://source/").as_deref(),
///     Some("http://target")
/// );
/// ```
pub fn check_for_meta(content: &str, base_url: &str) -> Option<String> {
    let document = Html::parse_document(content);

    let meta = document.select(&META_REFRESH_SELECTOR).find(|element| {
        element
            .value()
            .attr("http-equiv")
            .is_some_and(|value| value.trim().eq_ignore_ascii_case("refresh"))
    })?;
    let refresh = meta.value().attr("content")?;

    let parts: Vec<&str> = refresh.split(';').collect();
    let [_delay, target_spec] = parts.as_slice() else {
        return None;
    };

    let captures = REFRESH_URL_PATTERN.captures(target_spec)?;
    let target = captures
        .get(1)?
        .as_str()
        .trim_matches(|c| c == '\'' || c == '"')
        .trim();
    if target.is_empty() {
        return None;
    }

    Some(join_with_base(base_url, target))
}

fn join_with_base(base_url: &str, target: &str) -> String {
    // Absolute targets pass through untouched
    if url::Url::parse(target).is_ok() {
        return target.to_string();
    }
    match url::Url::parse(base_url).and_then(|base| base.join(target)) {
        Ok(joined) => joined.to_string(),
        Err(_) => target.to_string(),
    }
}
