//! Integration tests for `WikiClient`: cache reuse, change-manifest
//! invalidation, persistence across restarts, and endpoint switching.

use tempfile::TempDir;
use wikiscout::config::{
    CacheConfig, Config, EndpointProfile, Endpoints, FetcherConfig, PrefsConfig, ProfileKind,
};
use wikiscout::crawler::WikiClient;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(primary_uri: &str, mirror_uri: &str, dir: &TempDir) -> Config {
    Config {
        fetcher: FetcherConfig {
            max_concurrent_requests: 4,
            retry_attempts: 2,
            retry_base_delay_ms: 20,
        },
        cache: CacheConfig {
            path: dir.path().join("cache.json").to_string_lossy().to_string(),
            manifest_ttl_secs: 60,
        },
        prefs: PrefsConfig {
            path: dir.path().join("prefs.json").to_string_lossy().to_string(),
        },
        endpoints: Endpoints {
            primary: EndpointProfile::for_base(primary_uri),
            mirror: EndpointProfile::for_base(mirror_uri),
        },
    }
}

async fn mount_manifest(server: &MockServer, entries: &[(&str, &str)]) {
    let urls: String = entries
        .iter()
        .map(|(loc, lastmod)| {
            format!("<url><loc>{}</loc><lastmod>{}</lastmod></url>", loc, lastmod)
        })
        .collect();
    let body = format!(r#"<?xml version="1.0"?><urlset>{}</urlset>"#, urls);

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

fn article_body(text: &str, stamp: &str) -> String {
    format!(
        r#"<html><body>
        <div id="page-content"><p>{}</p></div>
        <div id="page-info"><span>{} (3 days ago)</span></div>
        </body></html>"#,
        text, stamp
    )
}

#[tokio::test]
async fn test_second_read_is_served_from_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_manifest(&server, &[]).await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Body text.", "12:00 01 Jan 2020")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();
    let url = format!("{}/article", server.uri());

    let first = client.get_or_fetch(&url).await.unwrap();
    let second = client.get_or_fetch(&url).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_manifest_entry_newer_than_cache_forces_refetch() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/article", server.uri());

    // The manifest reports an edit long after the page's own revision
    // stamp, so the cached copy must not be reused.
    mount_manifest(&server, &[(url.as_str(), "2024-06-01T00:00:00Z")]).await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Old text.", "12:00 01 Jan 2020")),
        )
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("New text.", "12:00 01 Jun 2024")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();

    let first = client.get_or_fetch(&url).await.unwrap();
    let second = client.get_or_fetch(&url).await.unwrap();

    assert!(first.contains("Old text."));
    assert!(second.contains("New text."));
}

#[tokio::test]
async fn test_manifest_entry_older_than_cache_serves_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/article", server.uri());

    mount_manifest(&server, &[(url.as_str(), "2019-05-05T10:00:00Z")]).await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Steady text.", "12:00 01 Jan 2020")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();

    client.get_or_fetch(&url).await.unwrap();
    let second = client.get_or_fetch(&url).await.unwrap();

    assert!(second.contains("Steady text."));
}

#[tokio::test]
async fn test_url_absent_from_manifest_serves_cache() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let other = format!("{}/other-page", server.uri());

    // The manifest knows about a different page only; ours counts as
    // unchanged.
    mount_manifest(&server, &[(other.as_str(), "2030-01-01T00:00:00Z")]).await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Unlisted text.", "12:00 01 Jan 2020")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();
    let url = format!("{}/article", server.uri());

    client.get_or_fetch(&url).await.unwrap();
    let second = client.get_or_fetch(&url).await.unwrap();

    assert!(second.contains("Unlisted text."));
}

#[tokio::test]
async fn test_cache_survives_restart() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_manifest(&server, &[]).await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Durable text.", "12:00 01 Jan 2020")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let url = format!("{}/article", server.uri());

    {
        let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();
        client.get_or_fetch(&url).await.unwrap();
    }

    let reopened = WikiClient::new(&config, ProfileKind::Primary).unwrap();
    let body = reopened.get_or_fetch(&url).await.unwrap();

    assert!(body.contains("Durable text."));
}

#[tokio::test]
async fn test_manifest_fetch_failure_is_tolerated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Reachable text.", "12:00 01 Jan 2020")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = test_config(&server.uri(), &server.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();
    let url = format!("{}/article", server.uri());

    let first = client.get_or_fetch(&url).await.unwrap();
    let second = client.get_or_fetch(&url).await.unwrap();

    assert!(first.contains("Reachable text."));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_endpoint_switch_refreshes_manifest_from_new_host() {
    let primary = MockServer::start().await;
    let mirror = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_manifest(&primary, &[]).await;

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<urlset></urlset>"))
        .expect(1)
        .mount(&mirror)
        .await;

    Mock::given(method("GET"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Primary text.", "12:00 01 Jan 2020")),
        )
        .mount(&primary)
        .await;

    Mock::given(method("GET"))
        .and(path("/mirrored"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("Mirror text.", "12:00 01 Jan 2020")),
        )
        .mount(&mirror)
        .await;

    Mock::given(method("GET"))
        .and(path("/mirrored-too"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(article_body("More mirror text.", "12:00 01 Jan 2020")),
        )
        .mount(&mirror)
        .await;

    let config = test_config(&primary.uri(), &mirror.uri(), &dir);
    let client = WikiClient::new(&config, ProfileKind::Primary).unwrap();

    client
        .get_or_fetch(&format!("{}/article", primary.uri()))
        .await
        .unwrap();

    let mirror_profile = config.profile(ProfileKind::Mirror).clone();
    client.set_endpoint(mirror_profile.clone()).await;
    client
        .get_or_fetch(&format!("{}/mirrored", mirror.uri()))
        .await
        .unwrap();

    // Re-selecting the active profile must not reset freshness; the
    // mirror manifest stays at exactly one fetch.
    client.set_endpoint(mirror_profile).await;
    client
        .get_or_fetch(&format!("{}/mirrored-too", mirror.uri()))
        .await
        .unwrap();
}
