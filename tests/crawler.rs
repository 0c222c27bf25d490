use housing_crawler::config::DEFAULT_USER_AGENT;
use housing_crawler::{ClientConfig, CrawlError, Crawler, CrawlerRegistry, Expose, HttpClient};
use pretty_assertions::assert_eq;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing_test::traced_test;
use wiremock::matchers::{any, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PAGE: &str = r#"
    <html><body><ul>
      <li class="listing">Götgatan 120</li>
      <li class="listing">Ringvägen 11A</li>
    </ul></body></html>
"#;

/// Crawler that turns every `li.listing` into an expose
struct SearchCrawler {
    pattern: Regex,
    http: HttpClient,
    extract_calls: Arc<AtomicUsize>,
}

impl SearchCrawler {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).unwrap(),
            http: HttpClient::new(&ClientConfig::default()).unwrap(),
            extract_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn for_server(server: &MockServer) -> Self {
        Self::new(&format!("^{}/search", regex::escape(&server.uri())))
    }
}

impl Crawler for SearchCrawler {
    fn url_pattern(&self) -> &Regex {
        &self.pattern
    }

    fn http(&self) -> &HttpClient {
        &self.http
    }

    fn extract_data(&self, document: &Html) -> Vec<Expose> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);
        let selector = Selector::parse("li.listing").unwrap();
        document
            .select(&selector)
            .map(|li| {
                let mut expose = Expose::new();
                expose.insert("address".to_string(), json!(li.text().collect::<String>()));
                expose
            })
            .collect()
    }
}

fn addresses(exposes: &[Expose]) -> Vec<String> {
    exposes
        .iter()
        .map(|e| e["address"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn non_matching_url_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = SearchCrawler::for_server(&server);
    let exposes = crawler
        .crawl(&format!("{}/listings", server.uri()), None)
        .await
        .unwrap();

    assert!(exposes.is_empty());
    assert_eq!(crawler.extract_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn matching_url_returns_extracted_exposes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = SearchCrawler::for_server(&server);
    let exposes = crawler
        .crawl(&format!("{}/search?page=2", server.uri()), Some(5))
        .await
        .unwrap();

    assert_eq!(addresses(&exposes), vec!["Götgatan 120", "Ringvägen 11A"]);
    assert_eq!(crawler.extract_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn requests_carry_browser_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .and(header("cache-control", "no-cache"))
        .and(header("sec-fetch-dest", "document"))
        .and(header("accept-language", "en-US,en;q=0.9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = SearchCrawler::for_server(&server);
    let exposes = crawler
        .crawl(&format!("{}/search", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(exposes.len(), 2);
}

#[tokio::test]
#[traced_test]
async fn server_error_body_is_still_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>error</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = SearchCrawler::for_server(&server);
    let exposes = crawler
        .crawl(&format!("{}/search", server.uri()), None)
        .await
        .unwrap();

    assert!(exposes.is_empty());
    assert_eq!(crawler.extract_calls.load(Ordering::SeqCst), 1);
    assert!(logs_contain("Got response (500): <html>error</html>"));
}

#[tokio::test]
async fn body_is_decoded_with_response_charset() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            b"<html><body><p>Stra\xdfe K\xf6ln</p></body></html>".to_vec(),
            "text/html; charset=iso-8859-1",
        ))
        .mount(&server)
        .await;

    let http = HttpClient::new(&ClientConfig::default()).unwrap();
    let document = http
        .get_document(&format!("{}/search", server.uri()))
        .await
        .unwrap();

    let selector = Selector::parse("p").unwrap();
    let text: String = document.select(&selector).next().unwrap().text().collect();
    assert_eq!(text, "Straße Köln");
}

#[tokio::test]
async fn server_error_with_listings_still_yields_them() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;

    let crawler = SearchCrawler::for_server(&server);
    let exposes = crawler
        .crawl(&format!("{}/search", server.uri()), None)
        .await
        .unwrap();

    assert_eq!(exposes.len(), 2);
}

#[tokio::test]
#[traced_test]
async fn unreachable_host_yields_nothing() {
    let crawler = SearchCrawler::new(r"^http://127\.0\.0\.1");
    let url = "http://127.0.0.1:1/search";

    let exposes = crawler.crawl(url, None).await.unwrap();
    assert!(exposes.is_empty());
    assert_eq!(crawler.extract_calls.load(Ordering::SeqCst), 0);
    assert!(logs_contain("Connection to 127.0.0.1:1 failed"));

    let err = crawler.get_results(url, None).await.unwrap_err();
    assert!(err.is_connection());
    assert!(matches!(err, CrawlError::Connection { url: failed, .. } if failed == url));
}

#[tokio::test]
async fn registry_tags_exposes_with_crawler_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;

    let mut registry = CrawlerRegistry::new();
    registry.register(Box::new(SearchCrawler::for_server(&server)));
    assert_eq!(registry.names(), vec!["SearchCrawler"]);

    let urls = vec![
        format!("{}/search", server.uri()),
        "https://unrelated.example/search".to_string(),
    ];
    let exposes = registry.crawl_all(&urls, None).await;

    assert_eq!(exposes.len(), 2);
    assert!(exposes.iter().all(|e| e["crawler"] == "SearchCrawler"));

    let detailed = registry.expose_details(exposes[0].clone()).await.unwrap();
    assert_eq!(detailed, exposes[0]);
}

#[tokio::test]
async fn registry_skips_failing_crawlers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(SEARCH_PAGE))
        .mount(&server)
        .await;

    let mut registry = CrawlerRegistry::new();
    // Matches everything, but relative URLs cannot be requested
    registry.register(Box::new(SearchCrawler::new("search")));
    registry.register(Box::new(SearchCrawler::for_server(&server)));

    let urls = vec!["/search".to_string(), format!("{}/search", server.uri())];
    let exposes = registry.crawl_all(&urls, None).await;

    // The first crawler fails on "/search" and finds both listings on the
    // server URL; the second only accepts the server URL.
    assert_eq!(exposes.len(), 4);
}

#[tokio::test]
async fn details_of_unknown_crawler_pass_through() {
    let registry = CrawlerRegistry::new();
    let mut expose = Expose::new();
    expose.insert("crawler".to_string(), json!("Hemnet"));

    let detailed = registry.expose_details(expose.clone()).await.unwrap();
    assert_eq!(detailed, expose);
}
