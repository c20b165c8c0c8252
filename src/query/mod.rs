//! Query engine for the wiki inventory
//!
//! Every lookup a front end needs is answered here, always through the
//! shared [`WikiClient`]: random article, whole-word title search,
//! tag-set search, and scored full-text search. Handlers stay thin;
//! they render what these operations return.

pub mod snippet;

pub use snippet::Style;

use crate::crawler::parser::{self, ArticleLink};
use crate::crawler::{Crawler, DiscoveryMode, WikiClient};
use crate::Result;
use rand::seq::SliceRandom;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

/// Results shown per page when a front end paginates search output
pub const RESULTS_PER_PAGE: usize = 5;

/// A found article with its lead sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,

    /// First sentence of the article; `None` when the page has no
    /// content block at all
    pub summary: Option<String>,
}

/// One full-text search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub url: String,

    /// Occurrences of the query in the article text
    pub score: usize,

    /// Highlighted sentence quoting the match; empty when no single
    /// sentence contains it
    pub snippet: String,
}

/// Answers queries against the active wiki endpoint
pub struct QueryEngine {
    client: Arc<WikiClient>,
}

impl QueryEngine {
    pub fn new(client: Arc<WikiClient>) -> Self {
        Self { client }
    }

    fn crawler(&self) -> Crawler {
        Crawler::new(Arc::clone(&self.client))
    }

    /// Picks a random article and summarizes it
    ///
    /// Discovery runs with system pages excluded; draft pages and
    /// underscore-named service pages are dropped on top of that.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(summary))` - A randomly chosen article
    /// * `Ok(None)` - The listing yielded no eligible articles
    pub async fn random_page(&self) -> Result<Option<ArticleSummary>> {
        let links = self
            .crawler()
            .discover_links(DiscoveryMode::ExcludeSystemPages)
            .await?;

        let candidates: Vec<ArticleLink> = links
            .into_iter()
            .filter(|link| !link.url.contains("draft:") && !link.url.contains('_'))
            .collect();

        let picked = {
            let mut rng = rand::thread_rng();
            candidates.choose(&mut rng).cloned()
        };

        let link = match picked {
            Some(link) => link,
            None => return Ok(None),
        };

        info!("random pick: {}", link.url);
        Ok(Some(self.summarize(link).await?))
    }

    /// Finds the first article whose title contains the query as a
    /// whole word, case-insensitively
    ///
    /// # Returns
    ///
    /// * `Ok(Some(summary))` - The first matching article in listing order
    /// * `Ok(None)` - No title matched
    pub async fn find_by_title(&self, title: &str) -> Result<Option<ArticleSummary>> {
        let links = self
            .crawler()
            .discover_links(DiscoveryMode::Unfiltered)
            .await?;

        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&title.to_lowercase())))?;
        let matched = links
            .into_iter()
            .find(|link| pattern.is_match(&link.title.to_lowercase()));

        let link = match matched {
            Some(link) => link,
            None => return Ok(None),
        };

        Ok(Some(self.summarize(link).await?))
    }

    /// Articles carrying every requested tag
    ///
    /// Candidates come from the tag index of the first requested tag;
    /// each candidate's own tag set is then checked against the full
    /// request. Tags are matched lowercased. Candidates that fail to
    /// fetch are skipped.
    ///
    /// # Arguments
    ///
    /// * `tags` - Requested tags; an empty request yields no results
    pub async fn search_by_tags(&self, tags: &[String]) -> Result<Vec<ArticleLink>> {
        let wanted: Vec<String> = tags
            .iter()
            .map(|tag| tag.trim().to_lowercase())
            .filter(|tag| !tag.is_empty())
            .collect();

        let first = match wanted.first() {
            Some(first) => first.clone(),
            None => return Ok(Vec::new()),
        };

        let endpoint = self.client.endpoint().await;
        let index_url = format!(
            "{}/tag/{}",
            endpoint.tag_search_url.trim_end_matches('/'),
            first
        );
        let base_url = Url::parse(&endpoint.base_url)?;

        let index = self.client.get_or_fetch(&index_url).await?;
        let candidates = parser::extract_tag_candidates(&index, &base_url);
        debug!("{} candidates under tag '{}'", candidates.len(), first);

        let wanted: HashSet<String> = wanted.into_iter().collect();
        let mut matches = Vec::new();
        for candidate in candidates {
            let body = match self.client.get_or_fetch(&candidate.url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("skipping tag candidate {}: {}", candidate.url, e);
                    continue;
                }
            };

            let page_tags = parser::extract_tags(&body);
            if wanted.is_subset(&page_tags) {
                matches.push(candidate);
            }
        }

        Ok(matches)
    }

    /// Scores every article by query occurrences and ranks the hits
    ///
    /// Draft and admin URLs are skipped before fetching; system-tagged
    /// pages and articles without a single occurrence are dropped
    /// after. Articles that fail to fetch are skipped with a warning.
    /// Hits come back sorted by score, highest first; ties keep
    /// discovery order.
    ///
    /// # Arguments
    ///
    /// * `query` - Text to count occurrences of, case-insensitively
    /// * `style` - Markup flavor for the highlighted snippets
    pub async fn full_text_search(&self, query: &str, style: Style) -> Result<Vec<SearchHit>> {
        let query = query.trim();
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let links = self
            .crawler()
            .discover_links(DiscoveryMode::Unfiltered)
            .await?;

        let mut hits = Vec::new();
        for link in links {
            if link.url.contains("draft:") || link.url.contains("admin:") {
                continue;
            }

            let body = match self.client.get_or_fetch(&link.url).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("skipping {}: {}", link.url, e);
                    continue;
                }
            };

            let text = match parser::extract_primary_content(&body) {
                Some(text) => text,
                None => continue,
            };

            let score = text.to_lowercase().matches(&needle).count();
            if score == 0 {
                continue;
            }

            let tags = parser::extract_tags(&body);
            if parser::is_system_tagged(&tags) {
                continue;
            }

            let snippet = snippet::matching_sentence(&text, query, style).unwrap_or_default();
            hits.push(SearchHit {
                title: link.title,
                url: link.url,
                score,
                snippet,
            });
        }

        hits.sort_by(|a, b| b.score.cmp(&a.score));
        info!("full-text search for '{}' matched {} articles", query, hits.len());
        Ok(hits)
    }

    /// Fetches an article and attaches its lead sentence
    async fn summarize(&self, link: ArticleLink) -> Result<ArticleSummary> {
        let body = self.client.get_or_fetch(&link.url).await?;
        let summary = parser::extract_primary_content(&body).map(|text| first_sentence(&text));

        Ok(ArticleSummary {
            title: link.title,
            url: link.url,
            summary,
        })
    }
}

/// First sentence of the text, up to and including the first period
///
/// Text without a period is returned whole, period appended.
fn first_sentence(text: &str) -> String {
    match text.find('.') {
        Some(idx) => format!("{}.", text[..idx].trim()),
        None => format!("{}.", text.trim()),
    }
}
