//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crate, including:
//! - Building an HTTP client with a desktop browser profile
//! - Bounding concurrent in-flight requests with a semaphore
//! - Retrying transient failures with exponential backoff

use crate::config::FetcherConfig;
use crate::{Result, ScoutError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Browser identity presented to the wiki. Wikidot serves cut-down
/// markup to unknown agents, so requests carry a desktop profile.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

const ACCEPT_LANGUAGE_VALUE: &str = "ru-RU,ru;q=0.9,en-US;q=0.8,en;q=0.7";
const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Bounded, retrying page fetcher
///
/// Every request in the crate goes through one of these. A semaphore
/// caps how many requests are in flight at once; backoff sleeps happen
/// outside the gate so a stalled retry never starves other work.
pub struct Fetcher {
    client: Client,
    gate: Semaphore,
    retry_attempts: u32,
    retry_base_delay: Duration,
}

impl Fetcher {
    /// Creates a fetcher from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Gate width, attempt count, and base backoff delay
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = build_http_client()?;

        Ok(Self {
            client,
            gate: Semaphore::new(config.max_concurrent_requests),
            retry_attempts: config.retry_attempts.max(1),
            retry_base_delay: config.retry_base_delay(),
        })
    }

    /// Fetches a URL and returns its body
    ///
    /// Transport errors and non-2xx statuses both count as failed
    /// attempts. The delay before attempt n+1 is `base * 2^(n-1)`, so
    /// each wait doubles the previous one.
    ///
    /// # Arguments
    ///
    /// * `url` - The absolute URL to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - Response body of the first successful attempt
    /// * `Err(ScoutError::Http)` - All attempts failed; carries the last error
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 1u32;

        loop {
            match self.try_fetch(url).await {
                Ok(body) => {
                    debug!("fetched {} on attempt {}", url, attempt);
                    return Ok(body);
                }
                Err(source) => {
                    warn!(
                        "attempt {}/{} for {} failed: {}",
                        attempt, self.retry_attempts, url, source
                    );

                    if attempt >= self.retry_attempts {
                        return Err(ScoutError::Http {
                            url: url.to_string(),
                            source,
                        });
                    }

                    let delay = self.retry_base_delay * 2u32.pow(attempt - 1);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One attempt, holding a gate permit for the duration of the request
    async fn try_fetch(&self, url: &str) -> std::result::Result<String, reqwest::Error> {
        let _permit = self
            .gate
            .acquire()
            .await
            .expect("fetch gate is never closed");

        let response = self.client.get(url).send().await?;
        let response = response.error_for_status()?;
        response.text().await
    }
}

/// Builds the HTTP client used for all wiki requests
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client() -> std::result::Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));

    Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}
