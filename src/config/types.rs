use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Main configuration structure for wikiscout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub prefs: PrefsConfig,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl Config {
    /// Returns the endpoint profile for the given profile name.
    pub fn profile(&self, kind: ProfileKind) -> &EndpointProfile {
        match kind {
            ProfileKind::Primary => &self.endpoints.primary,
            ProfileKind::Mirror => &self.endpoints.mirror,
        }
    }
}

/// Fetcher behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Maximum number of concurrent in-flight requests
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: usize,

    /// Total attempts per URL before giving up
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Delay before the second attempt (milliseconds); doubles per attempt
    #[serde(rename = "retry-base-delay-ms")]
    pub retry_base_delay_ms: u64,
}

impl FetcherConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: 5,
            retry_attempts: 3,
            retry_base_delay_ms: 1000,
        }
    }
}

/// Document cache configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Path to the JSON cache file
    pub path: String,

    /// How long a fetched change manifest stays fresh (seconds)
    #[serde(rename = "manifest-ttl-secs")]
    pub manifest_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: "cache.json".to_string(),
            manifest_ttl_secs: 60,
        }
    }
}

/// User preference store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrefsConfig {
    /// Path to the JSON preference file
    pub path: String,
}

impl Default for PrefsConfig {
    fn default() -> Self {
        Self {
            path: "user_settings.json".to_string(),
        }
    }
}

/// The two selectable wiki endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub primary: EndpointProfile,
    pub mirror: EndpointProfile,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            primary: EndpointProfile::for_base("http://castopia-wiki.wikidot.com"),
            mirror: EndpointProfile::for_base("https://castopia.obscurative.ru"),
        }
    }
}

/// URLs that define one wiki endpoint
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EndpointProfile {
    /// Root of the site, used to resolve relative article links
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// First page of the full article listing
    #[serde(rename = "listing-url")]
    pub listing_url: String,

    /// Tag index page; tag lookups append `/tag/<name>`
    #[serde(rename = "tag-search-url")]
    pub tag_search_url: String,
}

impl EndpointProfile {
    /// Builds a profile from a site root using the standard Wikidot
    /// system-page locations.
    pub fn for_base(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            base_url: base.to_string(),
            listing_url: format!("{}/system:all-pages", base),
            tag_search_url: format!("{}/system:page-tags", base),
        }
    }
}

/// Name of a configured endpoint profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileKind {
    Primary,
    Mirror,
}

impl ProfileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProfileKind::Primary => "primary",
            ProfileKind::Mirror => "mirror",
        }
    }

    /// Parses a profile name, case-insensitively. Returns `None` for
    /// anything that is not a configured profile.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "primary" => Some(ProfileKind::Primary),
            "mirror" => Some(ProfileKind::Mirror),
            _ => None,
        }
    }
}

impl fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_kind_round_trip() {
        assert_eq!(ProfileKind::from_name("primary"), Some(ProfileKind::Primary));
        assert_eq!(ProfileKind::from_name("MIRROR"), Some(ProfileKind::Mirror));
        assert_eq!(ProfileKind::from_name("  mirror  "), Some(ProfileKind::Mirror));
        assert_eq!(ProfileKind::from_name("staging"), None);
        assert_eq!(ProfileKind::Primary.as_str(), "primary");
    }

    #[test]
    fn test_profile_for_base_trims_trailing_slash() {
        let profile = EndpointProfile::for_base("https://wiki.example.com/");
        assert_eq!(profile.base_url, "https://wiki.example.com");
        assert_eq!(profile.listing_url, "https://wiki.example.com/system:all-pages");
        assert_eq!(
            profile.tag_search_url,
            "https://wiki.example.com/system:page-tags"
        );
    }

    #[test]
    fn test_config_profile_selection() {
        let config = Config {
            fetcher: FetcherConfig::default(),
            cache: CacheConfig::default(),
            prefs: PrefsConfig::default(),
            endpoints: Endpoints::default(),
        };

        assert_eq!(
            config.profile(ProfileKind::Primary).base_url,
            "http://castopia-wiki.wikidot.com"
        );
        assert_eq!(
            config.profile(ProfileKind::Mirror).base_url,
            "https://castopia.obscurative.ru"
        );
    }
}
