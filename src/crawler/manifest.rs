//! Change manifest tracking
//!
//! The wiki publishes a sitemap listing every page alongside its last
//! modification time. This module keeps one fetched copy of that
//! manifest, refreshes it after a short TTL, and answers the question
//! the document cache needs answered: when did the site last change
//! this URL?

use crate::crawler::fetcher::Fetcher;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use scraper::{Html, Selector};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

/// Holds the endpoint's change manifest with a freshness TTL
pub struct ManifestTracker {
    ttl: Duration,
    state: RwLock<ManifestState>,
}

#[derive(Default)]
struct ManifestState {
    entries: HashMap<String, NaiveDateTime>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl ManifestTracker {
    /// Creates an empty tracker
    ///
    /// # Arguments
    ///
    /// * `ttl` - How long a fetched manifest stays fresh
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            state: RwLock::new(ManifestState::default()),
        }
    }

    /// Refetches the manifest if the held copy is older than the TTL
    ///
    /// The new copy replaces the old one atomically. A failed refresh is
    /// logged and the held copy, possibly empty, stays in use.
    ///
    /// # Arguments
    ///
    /// * `fetcher` - Fetcher to retrieve the manifest through
    /// * `base_url` - Endpoint root; the manifest lives at `/sitemap.xml`
    pub async fn refresh_if_stale(&self, fetcher: &Fetcher, base_url: &str) {
        {
            let state = self.state.read().await;
            if let Some(refreshed_at) = state.refreshed_at {
                if Utc::now() - refreshed_at < self.ttl {
                    return;
                }
            }
        }

        let manifest_url = match manifest_url(base_url) {
            Some(url) => url,
            None => {
                warn!("cannot derive manifest URL from {}", base_url);
                return;
            }
        };

        let body = match fetcher.fetch(&manifest_url).await {
            Ok(body) => body,
            Err(e) => {
                warn!("manifest refresh from {} failed: {}", manifest_url, e);
                return;
            }
        };

        let entries = parse_manifest(&body);
        debug!("manifest refreshed, {} entries", entries.len());

        let mut state = self.state.write().await;
        state.entries = entries;
        state.refreshed_at = Some(Utc::now());
    }

    /// Site-side modification time for a URL, if the manifest lists one
    pub async fn last_modified(&self, url: &str) -> Option<NaiveDateTime> {
        self.state.read().await.entries.get(url).copied()
    }

    /// Drops the held manifest so the next refresh must refetch
    ///
    /// Called when the active endpoint changes; the old endpoint's
    /// manifest says nothing about the new one.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.entries.clear();
        state.refreshed_at = None;
    }
}

/// Builds the manifest URL for an endpoint root
fn manifest_url(base_url: &str) -> Option<String> {
    let base = Url::parse(base_url).ok()?;
    base.join("/sitemap.xml").ok().map(|url| url.to_string())
}

/// Parses sitemap XML into url -> last-modified pairs
///
/// The sitemap is shallow enough to read with the HTML parser: each
/// `url` element carries a `loc` and usually a `lastmod`. Entries
/// without a parseable `lastmod` are skipped, which makes the cache
/// treat their pages as unchanged.
pub fn parse_manifest(xml: &str) -> HashMap<String, NaiveDateTime> {
    let document = Html::parse_document(xml);
    let mut entries = HashMap::new();

    let (url_selector, loc_selector, lastmod_selector) = match (
        Selector::parse("url"),
        Selector::parse("loc"),
        Selector::parse("lastmod"),
    ) {
        (Ok(url), Ok(loc), Ok(lastmod)) => (url, loc, lastmod),
        _ => return entries,
    };

    for entry in document.select(&url_selector) {
        let loc = match entry.select(&loc_selector).next() {
            Some(loc) => loc.text().collect::<String>().trim().to_string(),
            None => continue,
        };
        if loc.is_empty() {
            continue;
        }

        let lastmod = entry
            .select(&lastmod_selector)
            .next()
            .map(|element| element.text().collect::<String>())
            .and_then(|text| parse_lastmod(text.trim()));

        if let Some(stamp) = lastmod {
            entries.insert(loc, stamp);
        }
    }

    entries
}

/// Parses a `lastmod` value into naive UTC
///
/// Accepts full RFC 3339 stamps (offsets converted to UTC), stamps
/// without an offset, and bare dates (taken as midnight).
pub fn parse_lastmod(value: &str) -> Option<NaiveDateTime> {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(value) {
        return Some(stamp.naive_utc());
    }

    if let Ok(stamp) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Some(stamp);
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
