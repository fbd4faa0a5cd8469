//! Persisted client-side preferences.
//!
//! Two flags survive restarts: whether the desktop sidebar is collapsed and
//! whether toast sounds are enabled. They are stored as a small JSON object
//! under the same keys the web front end used for local storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;

fn enabled() -> bool {
    true
}

/// User preferences persisted between sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(rename = "sidebarCollapsed", default)]
    pub sidebar_collapsed: bool,
    #[serde(rename = "notificationSound", default = "enabled")]
    pub sound_enabled: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            sidebar_collapsed: false,
            sound_enabled: true,
        }
    }
}

/// File-backed preferences store.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: PathBuf,
}

impl PreferencesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read preferences; a missing or unreadable file yields the defaults.
    pub fn load(&self) -> Preferences {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(prefs) => prefs,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "Corrupt preferences file, using defaults");
                    Preferences::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No preferences file yet");
                Preferences::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Cannot read preferences, using defaults");
                Preferences::default()
            }
        }
    }

    /// Write preferences through a temporary file and an atomic rename.
    pub fn save(&self, prefs: &Preferences) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(prefs)?)?;
        std::fs::rename(&tmp, &self.path)?;
        debug!(path = %self.path.display(), ?prefs, "Preferences saved");
        Ok(())
    }

    /// Load, apply `change`, save, and return the new value.
    pub fn update(&self, change: impl FnOnce(&mut Preferences)) -> Result<Preferences> {
        let mut prefs = self.load();
        change(&mut prefs);
        self.save(&prefs)?;
        Ok(prefs)
    }
}
