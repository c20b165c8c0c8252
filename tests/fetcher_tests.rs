//! Integration tests for the HTTP fetcher: retry, backoff, and the
//! concurrency gate, all against a local mock server.

use futures::future::join_all;
use std::time::{Duration, Instant};
use wikiscout::config::FetcherConfig;
use wikiscout::crawler::Fetcher;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_fetcher(max_concurrent: usize, attempts: u32, base_delay_ms: u64) -> Fetcher {
    Fetcher::new(&FetcherConfig {
        max_concurrent_requests: max_concurrent,
        retry_attempts: attempts,
        retry_base_delay_ms: base_delay_ms,
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(200).set_body_string("hello wiki"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(2, 3, 10);
    let body = fetcher.fetch(&format!("{}/page", server.uri())).await.unwrap();

    assert_eq!(body, "hello wiki");
}

#[tokio::test]
async fn test_server_errors_are_retried_with_backoff() {
    let server = MockServer::start().await;

    // First two attempts hit a failing server, the third succeeds.
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(2, 3, 50);
    let started = Instant::now();
    let body = fetcher.fetch(&format!("{}/flaky", server.uri())).await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(body, "recovered");
    // Two inter-attempt waits of 50ms and 100ms.
    assert!(
        elapsed >= Duration::from_millis(140),
        "expected backoff before retries, finished in {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_gives_up_after_configured_attempts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(2, 3, 10);
    let result = fetcher.fetch(&format!("{}/broken", server.uri())).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_page_fails_after_retries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(2, 2, 10);
    let result = fetcher.fetch(&format!("{}/gone", server.uri())).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_gate_bounds_concurrent_requests() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("slow body")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(6)
        .mount(&server)
        .await;

    let fetcher = test_fetcher(2, 1, 10);
    let url = format!("{}/slow", server.uri());

    let started = Instant::now();
    let results = join_all((0..6).map(|_| fetcher.fetch(&url))).await;
    let elapsed = started.elapsed();

    assert!(results.iter().all(|result| result.is_ok()));
    // Six 100ms responses through a gate of two take at least three waves.
    assert!(
        elapsed >= Duration::from_millis(280),
        "gate admitted too many requests at once, finished in {:?}",
        elapsed
    );
}
