//! Tracking counter detection.
//!
//! Matches page content against a fixed table of analytics and metrics script
//! signatures.

use regex::Regex;
use std::sync::LazyLock;

use super::compile_regex_unsafe;

/// Counter name and signature pattern, in reporting order.
///
/// A name may appear on several rows; each matching row yields one entry.
pub const COUNTER_TYPES: &[(&str, &str)] = &[
    ("GOOGLE_ANALYTICS", r"google-analytics\.com/ga\.js"),
    ("YA_METRICA", r"mc\.yandex\.ru/metrika/watch\.js"),
    ("TOP_MAIL_RU", r"top-fwz1\.mail\.ru/counter"),
    ("TOP_MAIL_RU", r"top\.mail\.ru/jump\?from"),
    (
        "DOUBLECLICK",
        r"//googleads\.g\.doubleclick\.net/pagead/viewthroughconversion",
    ),
    ("VISTRACK", r"//vistrac?k\.ru/"),
    ("GOOGLE_ANALYTICS", r"//www\.google-analytics\.com/analytics\.js"),
    ("LI_RU", r"//counter\.yadro\.ru/hit"),
    ("RAMBLER_TOP100", r"counter\.rambler\.ru/top100"),
];

static COUNTER_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    COUNTER_TYPES
        .iter()
        .map(|(name, pattern)| {
            (
                *name,
                compile_regex_unsafe(&format!("(?is){}", pattern), "COUNTER_TYPES"),
            )
        })
        .collect()
});

/// Returns the counters whose signature occurs in `content`.
///
/// One entry per matching table row, in table order. Repeated occurrences of
/// a signature in the page still yield a single entry.
///
/// # Examples
///
/// ```
/// use redirect_checker::parse::get_counters;
///
/// let page = r#"<script src="//mc.yandex.ru/metrika/watch.js"></script>"#;
/// assert_eq!(get_counters(page), vec!["YA_METRICA".to_string()]);
/// ```
pub fn get_counters(content: &str) -> Vec<String> {
    COUNTER_PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(content))
        .map(|(name, _)| name.to_string())
        .collect()
}
