//! Blocker Settings
//!
//! Persists the three policy flags to the browser's `config.json` under the
//! user config directory. Loading is forgiving: a missing file, unreadable
//! file, or stale schema falls back to defaults, and unknown keys written by
//! other parts of the browser are left alone on read.

use anyhow::{Context, Result};
use flux_blocker::ContentBlocker;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// The persisted content-blocking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockerSettings {
    pub content_blocking_enabled: bool,
    pub block_ads: bool,
    pub block_trackers: bool,
}

impl Default for BlockerSettings {
    fn default() -> Self {
        Self {
            content_blocking_enabled: true,
            block_ads: true,
            block_trackers: true,
        }
    }
}

/// Config file location: `<config_dir>/flux/config.json`
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("flux")
        .join("config.json")
}

impl BlockerSettings {
    /// Load settings, falling back to defaults on any failure.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    info!("Loaded blocker settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Could not parse {}, using defaults: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Save settings, creating the config directory if needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating config dir {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    /// Push the flags into the blocker, like the browser's settings dialog
    /// does on save. Takes effect on the next classify call.
    pub fn apply_to(&self, blocker: &ContentBlocker) {
        blocker.set_enabled(self.content_blocking_enabled);
        blocker.set_block_ads(self.block_ads);
        blocker.set_block_trackers(self.block_trackers);
    }
}
