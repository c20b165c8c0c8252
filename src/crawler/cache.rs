//! Validated document cache
//!
//! Fetched pages are kept in memory keyed by URL, each entry stamped
//! with the revision time in effect when it was fetched. An entry is
//! served only while the change manifest does not list a newer
//! modification for its URL. The map is mirrored to a JSON file so a
//! restart starts warm; file trouble degrades to memory-only operation.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// One cached document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Revision time in effect when the document was fetched
    pub fetched_at: NaiveDateTime,

    /// The raw page body
    pub body: String,
}

/// URL-keyed document cache with manifest validation
pub struct DocumentCache {
    path: PathBuf,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl DocumentCache {
    /// Opens a cache backed by the given file
    ///
    /// A missing file starts an empty cache. An unreadable or corrupt
    /// file is logged and also starts empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = read_entries(&path);
        debug!("document cache opened with {} entries", entries.len());

        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    /// Looks up a document, enforcing manifest validity
    ///
    /// # Arguments
    ///
    /// * `url` - Cache key
    /// * `manifest_lastmod` - Site-side modification time for this URL,
    ///   if the manifest lists one
    ///
    /// # Returns
    ///
    /// * `Some(body)` - An entry exists and the manifest does not list
    ///   a newer modification for it
    /// * `None` - No entry, or a newer modification invalidated it; a
    ///   stale entry is evicted on the way out
    pub async fn lookup(
        &self,
        url: &str,
        manifest_lastmod: Option<NaiveDateTime>,
    ) -> Option<String> {
        {
            let entries = self.entries.read().await;
            match entries.get(url) {
                None => return None,
                Some(entry) => match manifest_lastmod {
                    Some(lastmod) if lastmod > entry.fetched_at => {
                        debug!("cache entry for {} superseded at {}", url, lastmod);
                    }
                    _ => return Some(entry.body.clone()),
                },
            }
        }

        let mut entries = self.entries.write().await;
        entries.remove(url);
        None
    }

    /// Stores a document and mirrors the cache to its file
    ///
    /// The snapshot is serialized while the write lock is held, so a
    /// concurrent store cannot drop this entry from the written file.
    pub async fn store(&self, url: &str, fetched_at: NaiveDateTime, body: String) {
        let snapshot = {
            let mut entries = self.entries.write().await;
            entries.insert(url.to_string(), CacheEntry { fetched_at, body });
            serde_json::to_string(&*entries)
        };

        match snapshot {
            Ok(json) => {
                if let Err(e) = tokio::fs::write(&self.path, json).await {
                    warn!(
                        "failed to persist document cache to {}: {}",
                        self.path.display(),
                        e
                    );
                }
            }
            Err(e) => warn!("failed to serialize document cache: {}", e),
        }
    }

    /// Number of cached documents
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

fn read_entries(path: &Path) -> HashMap<String, CacheEntry> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("ignoring corrupt cache file {}: {}", path.display(), e);
                HashMap::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => {
            warn!("cannot read cache file {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn stamp(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 7, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn temp_cache() -> (TempDir, DocumentCache) {
        let dir = TempDir::new().unwrap();
        let cache = DocumentCache::load(dir.path().join("cache.json"));
        (dir, cache)
    }

    #[tokio::test]
    async fn test_lookup_without_manifest_entry() {
        let (_dir, cache) = temp_cache();
        cache.store("https://w/a", stamp(1, 12), "body".to_string()).await;

        assert_eq!(cache.lookup("https://w/a", None).await, Some("body".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_with_older_manifest_stamp() {
        let (_dir, cache) = temp_cache();
        cache.store("https://w/a", stamp(2, 12), "body".to_string()).await;

        let served = cache.lookup("https://w/a", Some(stamp(1, 12))).await;
        assert_eq!(served, Some("body".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_with_equal_manifest_stamp() {
        let (_dir, cache) = temp_cache();
        cache.store("https://w/a", stamp(2, 12), "body".to_string()).await;

        let served = cache.lookup("https://w/a", Some(stamp(2, 12))).await;
        assert_eq!(served, Some("body".to_string()));
    }

    #[tokio::test]
    async fn test_newer_manifest_stamp_evicts() {
        let (_dir, cache) = temp_cache();
        cache.store("https://w/a", stamp(1, 12), "body".to_string()).await;

        assert_eq!(cache.lookup("https://w/a", Some(stamp(3, 0))).await, None);

        // The stale entry is gone, not merely skipped.
        assert_eq!(cache.lookup("https://w/a", None).await, None);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_unknown_url_misses() {
        let (_dir, cache) = temp_cache();
        assert_eq!(cache.lookup("https://w/missing", None).await, None);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");

        {
            let cache = DocumentCache::load(&path);
            cache.store("https://w/a", stamp(1, 12), "saved".to_string()).await;
        }

        let reopened = DocumentCache::load(&path);
        assert_eq!(reopened.len().await, 1);
        assert_eq!(
            reopened.lookup("https://w/a", None).await,
            Some("saved".to_string())
        );
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json at all").unwrap();

        let cache = DocumentCache::load(&path);
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let (_dir, cache) = temp_cache();
        assert!(cache.is_empty().await);
    }
}
