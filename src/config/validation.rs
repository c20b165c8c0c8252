use crate::config::types::{CacheConfig, Config, EndpointProfile, FetcherConfig, PrefsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_fetcher_config(&config.fetcher)?;
    validate_cache_config(&config.cache)?;
    validate_prefs_config(&config.prefs)?;
    validate_endpoint_profile("primary", &config.endpoints.primary)?;
    validate_endpoint_profile("mirror", &config.endpoints.mirror)?;
    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.retry_attempts < 1 || config.retry_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be between 1 and 10, got {}",
            config.retry_attempts
        )));
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "cache path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates preference store configuration
fn validate_prefs_config(config: &PrefsConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "prefs path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates one endpoint profile
fn validate_endpoint_profile(name: &str, profile: &EndpointProfile) -> Result<(), ConfigError> {
    validate_endpoint_url(name, "base-url", &profile.base_url)?;
    validate_endpoint_url(name, "listing-url", &profile.listing_url)?;
    validate_endpoint_url(name, "tag-search-url", &profile.tag_search_url)?;
    Ok(())
}

fn validate_endpoint_url(profile: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid {} for profile '{}': {}", field, profile, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} for profile '{}' must use http or https, got '{}'",
            field,
            profile,
            url.scheme()
        )));
    }

    Ok(())
}
