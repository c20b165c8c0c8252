//! Wikiscout: a caching crawler and query engine for Wikidot-style wikis
//!
//! This crate discovers the article inventory of a paginated wiki, keeps a
//! manifest-validated document cache, and answers the lookups a chat front end
//! needs: random article, title search, tag search, and full-text search.

pub mod config;
pub mod crawler;
pub mod prefs;
pub mod query;

use thiserror::Error;

/// Main error type for wikiscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for wikiscout operations
pub type Result<T> = std::result::Result<T, ScoutError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, EndpointProfile, ProfileKind};
pub use crawler::{ArticleLink, Crawler, DiscoveryMode, WikiClient};
pub use prefs::PreferenceStore;
pub use query::{ArticleSummary, QueryEngine, SearchHit};
