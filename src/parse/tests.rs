// Parse module tests.

use super::*;

#[test]
fn test_get_counters_with_no_counters() {
    assert!(get_counters("content without counters").is_empty());
}

#[test]
fn test_get_counters_analytics_and_metrics_in_table_order() {
    // Metrics signature first in the page, analytics first in the table
    let content = "mc.yandex.ru/metrika/watch.js google-analytics.com/ga.js";
    assert_eq!(
        get_counters(content),
        vec!["GOOGLE_ANALYTICS".to_string(), "YA_METRICA".to_string()]
    );
}

#[test]
fn test_get_counters_one_entry_per_signature() {
    let content = "google-analytics.com/ga.js\n".repeat(5);
    assert_eq!(get_counters(&content), vec!["GOOGLE_ANALYTICS".to_string()]);
}

#[test]
fn test_get_counters_same_name_from_two_rows() {
    let content = r#"<img src="//top-fwz1.mail.ru/counter?id=1"><a href="//top.mail.ru/jump?from=1">"#;
    assert_eq!(
        get_counters(content),
        vec!["TOP_MAIL_RU".to_string(), "TOP_MAIL_RU".to_string()]
    );
}

#[test]
fn test_get_counters_case_insensitive_and_multiline() {
    let content = "<script>\nvar s = '//COUNTER.YADRO.RU/hit?q';\n</script>";
    assert_eq!(get_counters(content), vec!["LI_RU".to_string()]);
}

#[test]
fn test_get_counters_vistrack_spellings() {
    assert_eq!(get_counters("//vistrack.ru/x"), vec!["VISTRACK".to_string()]);
    assert_eq!(get_counters("//vistrak.ru/x"), vec!["VISTRACK".to_string()]);
}

#[test]
fn test_counter_patterns_all_compile() {
    for (name, _) in COUNTER_TYPES {
        assert!(!name.is_empty());
    }
    // Forces compilation of every row
    assert!(get_counters("").is_empty());
}

#[test]
fn test_check_for_meta_correct() {
    let html = r#"<html><head><meta http-equiv="refresh" content="5; url=http://target.example/path?q=1"></head></html>"#;
    assert_eq!(
        check_for_meta(html, "http://source.example/").as_deref(),
        Some("http://target.example/path?q=1")
    );
}

#[test]
fn test_check_for_meta_zero_delay() {
    let html = r#"<meta http-equiv="refresh" content="0;url=http://target">"#;
    assert_eq!(
        check_for_meta(html, "http://source/").as_deref(),
        Some("http://target")
    );
}

#[test]
fn test_check_for_meta_http_equiv_case_and_url_marker_case() {
    let html = r#"<META HTTP-EQUIV="Refresh" CONTENT="0; URL='http://target.example/'">"#;
    assert_eq!(
        check_for_meta(html, "http://source.example/").as_deref(),
        Some("http://target.example/")
    );
}

#[test]
fn test_check_for_meta_relative_target_joined() {
    let html = r#"<meta http-equiv="refresh" content="1;url=/next">"#;
    assert_eq!(
        check_for_meta(html, "http://source.example/dir/page").as_deref(),
        Some("http://source.example/next")
    );
}

#[test]
fn test_check_for_meta_unparseable_base_keeps_target() {
    let html = r#"<meta http-equiv="refresh" content="wait;url=localhost/lal?what=dont_know">"#;
    assert_eq!(
        check_for_meta(html, "url").as_deref(),
        Some("localhost/lal?what=dont_know")
    );
}

#[test]
fn test_check_for_meta_no_meta() {
    assert_eq!(check_for_meta("<html><body>plain</body></html>", "http://a/"), None);
}

#[test]
fn test_check_for_meta_without_http_equiv() {
    let html = r#"<meta content="0;url=http://target">"#;
    assert_eq!(check_for_meta(html, "http://a/"), None);
}

#[test]
fn test_check_for_meta_http_equiv_not_refresh() {
    let html = r#"<meta http-equiv="no refresh" content="0;url=http://target">"#;
    assert_eq!(check_for_meta(html, "http://a/"), None);
}

#[test]
fn test_check_for_meta_content_not_two_parts() {
    let one = r#"<meta http-equiv="refresh" content="content">"#;
    let three = r#"<meta http-equiv="refresh" content="0;url=http://a;b">"#;
    assert_eq!(check_for_meta(one, "http://a/"), None);
    assert_eq!(check_for_meta(three, "http://a/"), None);
}

#[test]
fn test_check_for_meta_missing_url_marker() {
    let html = r#"<meta http-equiv="refresh" content="0;http://target">"#;
    assert_eq!(check_for_meta(html, "http://a/"), None);
}

#[test]
fn test_check_for_meta_skips_other_meta_tags() {
    let html = r#"<meta http-equiv="content-type" content="text/html; charset=utf-8">
        <meta http-equiv="refresh" content="0;url=http://target/">"#;
    assert_eq!(
        check_for_meta(html, "http://a/").as_deref(),
        Some("http://target/")
    );
}
