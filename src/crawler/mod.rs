//! Crawler module for wiki page fetching and discovery
//!
//! This module contains the crawling side of the crate, including:
//! - HTTP fetching with a concurrency gate and retry logic
//! - Change manifest tracking and the validated document cache
//! - The shared wiki client that ties those together
//! - Paginated article discovery and Wikidot HTML parsing

mod cache;
mod client;
mod discovery;
mod fetcher;
mod manifest;
pub mod parser;

pub use cache::{CacheEntry, DocumentCache};
pub use client::WikiClient;
pub use discovery::{listing_page_url, Crawler, DiscoveryMode};
pub use fetcher::{build_http_client, Fetcher, BROWSER_USER_AGENT};
pub use manifest::ManifestTracker;
pub use parser::{ArticleLink, SYSTEM_TAGS};
