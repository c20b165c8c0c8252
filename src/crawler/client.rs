//! Wiki client service
//!
//! `WikiClient` ties the fetcher, change manifest, and document cache
//! together behind one call, `get_or_fetch`. It also owns the active
//! endpoint profile: swapping profiles retargets later requests and
//! resets manifest freshness, since manifest entries from one endpoint
//! say nothing about the other.

use crate::config::{Config, EndpointProfile, ProfileKind};
use crate::crawler::cache::DocumentCache;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::manifest::ManifestTracker;
use crate::crawler::parser;
use crate::Result;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Shared service for validated page access
///
/// One instance is created at startup and handed to every query path.
/// All state lives behind async locks, so callers can share it freely
/// across tasks.
pub struct WikiClient {
    fetcher: Fetcher,
    cache: DocumentCache,
    manifest: ManifestTracker,
    endpoint: RwLock<EndpointProfile>,
}

impl WikiClient {
    /// Creates a client from configuration, starting on the given profile
    ///
    /// # Arguments
    ///
    /// * `config` - Full application configuration
    /// * `initial` - Endpoint profile to start on
    ///
    /// # Returns
    ///
    /// * `Ok(WikiClient)` - Ready client with the cache file loaded
    /// * `Err(ScoutError)` - The HTTP client could not be built
    pub fn new(config: &Config, initial: ProfileKind) -> Result<Self> {
        let fetcher = Fetcher::new(&config.fetcher)?;
        let cache = DocumentCache::load(&config.cache.path);
        let manifest =
            ManifestTracker::new(Duration::seconds(config.cache.manifest_ttl_secs as i64));
        let profile = config.profile(initial).clone();

        info!(
            "wiki client starting on profile '{}' ({})",
            initial, profile.base_url
        );

        Ok(Self {
            fetcher,
            cache,
            manifest,
            endpoint: RwLock::new(profile),
        })
    }

    /// The active endpoint profile
    pub async fn endpoint(&self) -> EndpointProfile {
        self.endpoint.read().await.clone()
    }

    /// Switches the active endpoint profile
    ///
    /// Setting the profile already in use is a no-op. A real switch
    /// resets manifest freshness; cached documents are keyed by
    /// absolute URL and stay untouched.
    pub async fn set_endpoint(&self, profile: EndpointProfile) {
        {
            let current = self.endpoint.read().await;
            if *current == profile {
                return;
            }
        }

        info!("switching endpoint to {}", profile.base_url);
        {
            let mut current = self.endpoint.write().await;
            *current = profile;
        }

        self.manifest.reset().await;
    }

    /// Returns a page body, from cache when the manifest allows it
    ///
    /// Steps, in order: refresh the manifest if stale, consult the
    /// cache, fetch on a miss, then stamp and store the fresh body. The
    /// stamp is the page's own revision time when the footer carries
    /// one, otherwise the fetch time.
    ///
    /// A cached entry is served when the manifest has no newer
    /// modification on record for the URL; URLs the manifest does not
    /// list at all are treated as unchanged.
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL of the page
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page body, cached or fresh
    /// * `Err(ScoutError::Http)` - The fetch failed after all retries
    pub async fn get_or_fetch(&self, url: &str) -> Result<String> {
        let base_url = self.endpoint.read().await.base_url.clone();
        self.manifest.refresh_if_stale(&self.fetcher, &base_url).await;

        let lastmod = self.manifest.last_modified(url).await;
        if let Some(body) = self.cache.lookup(url, lastmod).await {
            debug!("cache hit for {}", url);
            return Ok(body);
        }

        let body = self.fetcher.fetch(url).await?;
        let fetched_at =
            parser::extract_revision_stamp(&body).unwrap_or_else(|| Utc::now().naive_utc());
        self.cache.store(url, fetched_at, body.clone()).await;

        Ok(body)
    }
}
