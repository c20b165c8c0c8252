//! Configuration module for wikiscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use wikiscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Fetch gate width: {}", config.fetcher.max_concurrent_requests);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CacheConfig, Config, EndpointProfile, Endpoints, FetcherConfig, PrefsConfig, ProfileKind,
};

// Re-export parser functions
pub use parser::load_config;
