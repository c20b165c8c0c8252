//! Per-user endpoint preferences
//!
//! Each caller can pick which endpoint profile their queries use. The
//! store is a small JSON file mapping caller id to profile name, read
//! fresh before every query and rewritten on every change. Callers
//! without a recorded choice get the primary profile.

use crate::config::ProfileKind;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File-backed map from caller id to endpoint profile
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The profile the caller chose, or primary by default
    ///
    /// Reads the file on every call so changes made by other processes
    /// are picked up. A missing or unreadable file means everyone gets
    /// the default.
    pub fn profile_for(&self, user_id: &str) -> ProfileKind {
        read_prefs(&self.path)
            .get(user_id)
            .copied()
            .unwrap_or(ProfileKind::Primary)
    }

    /// Records the caller's choice and persists it
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The preference file was rewritten
    /// * `Err(ScoutError)` - The file could not be written
    pub fn set_profile(&self, user_id: &str, profile: ProfileKind) -> Result<()> {
        let mut prefs = read_prefs(&self.path);
        prefs.insert(user_id.to_string(), profile);

        let json = serde_json::to_string_pretty(&prefs)?;
        std::fs::write(&self.path, json)?;
        debug!("profile for {} set to {}", user_id, profile);
        Ok(())
    }
}

fn read_prefs(path: &Path) -> HashMap<String, ProfileKind> {
    match std::fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("ignoring corrupt preference file {}: {}", path.display(), e);
                HashMap::new()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
        Err(e) => {
            warn!("cannot read preference file {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}
