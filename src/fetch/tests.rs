// Redirect resolution tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use super::*;
use crate::error_handling::FetchError;
use crate::fetch::request::{FetchResponse, HttpFetcher};

/// Fetcher answering from a fixed map; unknown URLs fail like a refused connection.
struct MapFetcher {
    responses: HashMap<String, FetchResponse>,
    calls: Mutex<Vec<(String, Option<String>)>>,
}

impl MapFetcher {
    fn new(entries: &[(&str, Option<&str>, &str)]) -> Self {
        let responses = entries
            .iter()
            .map(|(url, redirect, body)| {
                (
                    url.to_string(),
                    FetchResponse {
                        status: if redirect.is_some() { 302 } else { 200 },
                        content: Some(body.to_string()),
                        redirect_url: redirect.map(str::to_string),
                    },
                )
            })
            .collect();
        Self {
            responses,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch(
        &self,
        url: &str,
        _timeout: Duration,
        user_agent: Option<&str>,
    ) -> Result<FetchResponse, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), user_agent.map(str::to_string)));
        self.responses
            .get(url)
            .cloned()
            .ok_or(FetchError::InvalidUrl(url::ParseError::EmptyHost))
    }
}

/// Resolver replaying a fixed sequence of hops.
struct ScriptedResolver {
    hops: Mutex<VecDeque<(Option<(RedirectType, &'static str)>, Option<&'static str>)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedResolver {
    fn new(hops: Vec<(Option<(RedirectType, &'static str)>, Option<&'static str>)>) -> Self {
        Self {
            hops: Mutex::new(hops.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ResolveHop for ScriptedResolver {
    async fn resolve(&self, url: &str, _timeout: Duration, _ua: Option<&str>) -> RedirectHop {
        self.calls.lock().unwrap().push(url.to_string());
        let (redirect, content) = self.hops.lock().unwrap().pop_front().unwrap_or((None, None));
        RedirectHop {
            url: url.to_string(),
            redirect: redirect.map(|(kind, target)| Redirect {
                kind,
                target: target.to_string(),
            }),
            content: content.map(str::to_string),
        }
    }
}

fn resolver(fetcher: MapFetcher) -> Resolver<MapFetcher> {
    let ignored = UrlPatterns::new(crate::config::DEFAULT_IGNORED_REDIRECT_PATTERNS)
        .expect("default patterns compile");
    Resolver::new(fetcher, ignored)
}

fn options(max_redirects: usize) -> WalkOptions {
    WalkOptions {
        max_redirects,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_resolve_fetch_error_is_error_hop() {
    let resolver = resolver(MapFetcher::new(&[]));
    let hop = resolver
        .resolve("http://down.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect_type(), Some(RedirectType::Error));
    assert_eq!(hop.target_url(), Some("http://down.example/"));
    assert_eq!(hop.content, None);
}

#[tokio::test]
async fn test_resolve_http_redirect() {
    let resolver = resolver(MapFetcher::new(&[(
        "http://a.example/",
        Some("http://b.example/next"),
        "moved",
    )]));
    let hop = resolver
        .resolve("http://a.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect_type(), Some(RedirectType::Http));
    assert_eq!(hop.target_url(), Some("http://b.example/next"));
    assert_eq!(hop.content.as_deref(), Some("moved"));
}

#[tokio::test]
async fn test_resolve_market_redirect_rewritten() {
    let resolver = resolver(MapFetcher::new(&[(
        "http://a.example/",
        Some("market://details?id=12345"),
        "",
    )]));
    let hop = resolver
        .resolve("http://a.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect_type(), Some(RedirectType::Http));
    assert_eq!(
        hop.target_url(),
        Some("https://play.google.com/store/apps/details?id=12345")
    );
}

#[tokio::test]
async fn test_resolve_ignored_login_redirect() {
    let resolver = resolver(MapFetcher::new(&[(
        "http://a.example/",
        Some("http://odnoklassniki.ru/123.st.redirect"),
        "content",
    )]));
    let hop = resolver
        .resolve("http://a.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect, None);
    assert_eq!(hop.content.as_deref(), Some("content"));
}

#[tokio::test]
async fn test_resolve_meta_redirect() {
    let resolver = resolver(MapFetcher::new(&[(
        "http://a.example/",
        None,
        r#"<meta http-equiv="refresh" content="0;url=/landing">"#,
    )]));
    let hop = resolver
        .resolve("http://a.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect_type(), Some(RedirectType::Meta));
    assert_eq!(hop.target_url(), Some("http://a.example/landing"));
}

#[tokio::test]
async fn test_resolve_no_redirect() {
    let resolver = resolver(MapFetcher::new(&[("http://a.example/", None, "final page")]));
    let hop = resolver
        .resolve("http://a.example/", Duration::from_secs(1), None)
        .await;
    assert_eq!(hop.redirect, None);
    assert_eq!(hop.content.as_deref(), Some("final page"));
}

#[tokio::test]
async fn test_resolve_passes_user_agent() {
    let fetcher = MapFetcher::new(&[("http://a.example/", None, "")]);
    let resolver = resolver(fetcher);
    resolver
        .resolve("http://a.example/", Duration::from_secs(1), Some("probe/1.0"))
        .await;
    let calls = resolver.fetcher.calls.lock().unwrap().clone();
    assert_eq!(
        calls,
        vec![("http://a.example/".to_string(), Some("probe/1.0".to_string()))]
    );
}

#[tokio::test]
async fn test_walk_first_hop_none() {
    let resolver = ScriptedResolver::new(vec![(None, None)]);
    let history = get_redirect_history(&resolver, "http://url.ru", &options(30)).await;
    assert_eq!(history.types, vec![]);
    assert_eq!(history.urls, vec!["http://url.ru".to_string()]);
    assert_eq!(history.counters, Vec::<String>::new());
}

#[tokio::test]
async fn test_walk_first_hop_error_stops() {
    let resolver = ScriptedResolver::new(vec![
        (
            Some((RedirectType::Error, "http://redirect.url")),
            Some("google-analytics.com/ga.js"),
        ),
        (Some((RedirectType::Http, "http://never.example")), None),
    ]);
    let history = get_redirect_history(&resolver, "http://example.ru", &options(30)).await;
    assert_eq!(history.types, vec![RedirectType::Error]);
    assert_eq!(
        history.urls,
        vec!["http://example.ru".to_string(), "http://redirect.url".to_string()]
    );
    assert_eq!(history.counters, vec!["GOOGLE_ANALYTICS".to_string()]);
    assert_eq!(resolver.call_count(), 1);
    assert!(history.has_error());
}

#[tokio::test]
async fn test_walk_max_redirects_one() {
    let resolver = ScriptedResolver::new(vec![
        (Some((RedirectType::Http, "http://redirect.url")), None),
        (Some((RedirectType::Http, "http://further.url")), None),
    ]);
    let history = get_redirect_history(&resolver, "http://example.ru", &options(1)).await;
    assert_eq!(history.types, vec![RedirectType::Http]);
    assert_eq!(
        history.urls,
        vec!["http://example.ru".to_string(), "http://redirect.url".to_string()]
    );
    assert_eq!(resolver.call_count(), 1);
}

#[tokio::test]
async fn test_walk_redirect_cycle_bounded() {
    let fetcher = MapFetcher::new(&[
        ("http://a.example/", Some("http://b.example/"), ""),
        ("http://b.example/", Some("http://a.example/"), ""),
    ]);
    let history = get_redirect_history(&resolver(fetcher), "http://a.example/", &options(5)).await;
    assert_eq!(history.types.len(), 5);
    assert_eq!(history.urls.len(), 6);
    assert_eq!(history.final_url(), Some("http://b.example/"));
}

#[tokio::test]
async fn test_walk_chain_collects_counters_in_hop_order() {
    let fetcher = MapFetcher::new(&[
        (
            "http://a.example/",
            None,
            r#"<meta http-equiv="refresh" content="0;url=http://b.example/">
               <script src="//mc.yandex.ru/metrika/watch.js"></script>"#,
        ),
        ("http://b.example/", None, "google-analytics.com/ga.js"),
    ]);
    let history = get_redirect_history(&resolver(fetcher), "http://a.example/", &options(30)).await;
    assert_eq!(history.types, vec![RedirectType::Meta]);
    assert_eq!(
        history.urls,
        vec!["http://a.example/".to_string(), "http://b.example/".to_string()]
    );
    assert_eq!(
        history.counters,
        vec!["YA_METRICA".to_string(), "GOOGLE_ANALYTICS".to_string()]
    );
}

#[tokio::test]
async fn test_walk_skipped_urls_not_fetched() {
    let skip = UrlPatterns::new(crate::config::DEFAULT_SKIP_URL_PATTERNS).unwrap();
    let opts = WalkOptions {
        skip,
        ..Default::default()
    };
    for url in ["https://my.mail.ru/apps/", "https://odnoklassniki.ru/"] {
        let resolver = ScriptedResolver::new(vec![]);
        let history = get_redirect_history(&resolver, url, &opts).await;
        assert_eq!(history, RedirectHistory {
            types: vec![],
            urls: vec![url.to_string()],
            counters: vec![],
        });
        assert_eq!(resolver.call_count(), 0);
    }
}

#[test]
fn test_history_to_result_shape() {
    let history = RedirectHistory {
        types: vec![RedirectType::Http, RedirectType::Meta],
        urls: vec!["a".into(), "b".into(), "c".into()],
        counters: vec!["LI_RU".into()],
    };
    assert_eq!(
        history.to_result(),
        serde_json::json!([["http_status", "meta_tag"], ["a", "b", "c"], ["LI_RU"]])
    );
}

#[test]
fn test_redirect_type_wire_name_matches_display() {
    use strum::IntoEnumIterator;

    for kind in RedirectType::iter() {
        assert_eq!(
            serde_json::to_value(kind).unwrap(),
            serde_json::Value::from(kind.to_string())
        );
    }
}

#[test]
fn test_redirect_type_names() {
    assert_eq!(RedirectType::Http.to_string(), "http_status");
    assert_eq!(RedirectType::Meta.as_ref(), "meta_tag");
    assert_eq!(RedirectType::Error.to_string(), "ERROR");
}

mod http {
    use super::*;
    use crate::config::MAX_RESPONSE_BODY_SIZE;
    use std::sync::Arc;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn http_resolver() -> Resolver<HttpFetcher> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("client builds");
        Resolver::new(HttpFetcher::new(Arc::new(client)), UrlPatterns::empty())
    }

    #[tokio::test]
    async fn test_fetch_relative_location_is_absolute() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/start"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", "/end"))
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&format!("{}/start", server.uri()), Duration::from_secs(5), None)
            .await;
        assert_eq!(hop.redirect_type(), Some(RedirectType::Http));
        assert_eq!(hop.target_url(), Some(format!("{}/end", server.uri()).as_str()));
    }

    #[tokio::test]
    async fn test_fetch_unparsable_location_is_passed_on_as_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(302).insert_header("Location", "http://exa mple.com/"))
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&server.uri(), Duration::from_secs(5), None)
            .await;
        assert_eq!(hop.redirect_type(), Some(RedirectType::Http));
        assert_eq!(hop.target_url(), Some("http://exa mple.com/"));
    }

    #[tokio::test]
    async fn test_fetch_oversized_body_is_skipped_but_redirect_kept() {
        let server = MockServer::start().await;
        let body = vec![b'a'; MAX_RESPONSE_BODY_SIZE as usize + 1];
        Mock::given(method("GET"))
            .and(path("/big"))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("Location", "/next")
                    .set_body_bytes(body),
            )
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&format!("{}/big", server.uri()), Duration::from_secs(5), None)
            .await;
        assert_eq!(hop.redirect_type(), Some(RedirectType::Http));
        assert_eq!(hop.target_url(), Some(format!("{}/next", server.uri()).as_str()));
        assert_eq!(hop.content, None);
    }

    #[tokio::test]
    async fn test_fetch_body_at_cap_is_read() {
        let server = MockServer::start().await;
        let body = "a".repeat(MAX_RESPONSE_BODY_SIZE as usize);
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&server.uri(), Duration::from_secs(5), None)
            .await;
        assert_eq!(hop.redirect, None);
        assert_eq!(hop.content.map(|c| c.len()), Some(body.len()));
    }

    #[tokio::test]
    async fn test_fetch_sends_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("user-agent", "probe/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&server.uri(), Duration::from_secs(5), Some("probe/1.0"))
            .await;
        assert_eq!(hop.redirect, None);
        assert_eq!(hop.content.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_error_hop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&server.uri(), Duration::from_millis(100), None)
            .await;
        assert_eq!(hop.redirect_type(), Some(RedirectType::Error));
        assert_eq!(hop.target_url(), Some(server.uri().as_str()));
    }

    #[tokio::test]
    async fn test_fetch_redirect_without_location_is_resolved() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(302).set_body_string("nowhere"))
            .mount(&server)
            .await;

        let hop = http_resolver()
            .resolve(&server.uri(), Duration::from_secs(5), None)
            .await;
        assert_eq!(hop.redirect, None);
    }
}
