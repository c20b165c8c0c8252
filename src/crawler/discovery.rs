//! Article discovery across the paginated listing
//!
//! The wiki lists its whole article inventory across numbered listing
//! pages. The crawler reads the pager total from the first page, fans
//! out over every page concurrently, and aggregates the links each page
//! yields. A listing page that fails to fetch is logged and skipped;
//! the remaining pages still produce a result.

use crate::crawler::client::WikiClient;
use crate::crawler::parser::{self, ArticleLink};
use crate::Result;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// What discovery should do with system-tagged service pages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryMode {
    /// Keep every listed article
    Unfiltered,

    /// Fetch each article and drop the ones tagged as service pages
    ExcludeSystemPages,
}

/// Walks the paginated article listing of the active endpoint
pub struct Crawler {
    client: Arc<WikiClient>,
}

impl Crawler {
    pub fn new(client: Arc<WikiClient>) -> Self {
        Self { client }
    }

    /// Discovers every article the listing advertises
    ///
    /// # Arguments
    ///
    /// * `mode` - Whether system-tagged pages are filtered out
    ///
    /// # Returns
    ///
    /// Aggregated links in listing order. An error is returned only
    /// when the first listing page, the one carrying the pager, cannot
    /// be read; later pages that fail are skipped with a warning.
    pub async fn discover_links(&self, mode: DiscoveryMode) -> Result<Vec<ArticleLink>> {
        let endpoint = self.client.endpoint().await;
        let base_url = Url::parse(&endpoint.base_url)?;

        let first_page = self.client.get_or_fetch(&endpoint.listing_url).await?;
        let total = parser::parse_total_pages(&first_page);
        debug!("listing spans {} pages", total);

        let page_urls: Vec<String> = (1..=total)
            .map(|page| listing_page_url(&endpoint.listing_url, page))
            .collect();

        let fetches = page_urls
            .iter()
            .map(|page_url| self.collect_page_links(page_url, &base_url, mode));
        let outcomes = join_all(fetches).await;

        let mut links = Vec::new();
        for (page_url, outcome) in page_urls.iter().zip(outcomes) {
            match outcome {
                Ok(mut page_links) => links.append(&mut page_links),
                Err(e) => warn!("skipping listing page {}: {}", page_url, e),
            }
        }

        info!(
            "discovered {} article links on {}",
            links.len(),
            endpoint.base_url
        );
        Ok(links)
    }

    /// Fetches one listing page and extracts its links
    ///
    /// In `ExcludeSystemPages` mode each linked article is fetched too
    /// so its tags can be checked; any failure inside the page makes
    /// the whole page count as failed.
    async fn collect_page_links(
        &self,
        page_url: &str,
        base_url: &Url,
        mode: DiscoveryMode,
    ) -> Result<Vec<ArticleLink>> {
        let body = self.client.get_or_fetch(page_url).await?;
        let links = parser::extract_article_links(&body, base_url);

        match mode {
            DiscoveryMode::Unfiltered => Ok(links),
            DiscoveryMode::ExcludeSystemPages => {
                let mut kept = Vec::new();
                for link in links {
                    let article = self.client.get_or_fetch(&link.url).await?;
                    let tags = parser::extract_tags(&article);
                    if parser::is_system_tagged(&tags) {
                        debug!("dropping system page {}", link.url);
                        continue;
                    }
                    kept.push(link);
                }
                Ok(kept)
            }
        }
    }
}

/// URL of the nth listing page; page 1 is the listing root itself
pub fn listing_page_url(listing_url: &str, page: usize) -> String {
    if page <= 1 {
        listing_url.to_string()
    } else {
        format!("{}/p/{}", listing_url.trim_end_matches('/'), page)
    }
}
