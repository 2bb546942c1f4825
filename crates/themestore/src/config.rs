//! # Configuration
//!
//! Store configuration is managed by [`confique`], which layers environment variables
//! over an optional TOML file over compiled defaults.
//!
//! ## Resolution Order
//!
//! 1. **Environment variables**: `THEMESTORE_THEMES_PATH`, `THEMESTORE_ACTIVE_THEME`,
//!    `THEMESTORE_CACHE_TTL_SECS`.
//! 2. **Config file**: the path given to [`StoreConfig::load`], if it exists.
//! 3. **Compiled defaults**: via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `themes_path` | platform data dir + `themes` | Directory holding the themes |
//! | `active_theme` | `default` | Theme opened by [`crate::store::ThemeStore::open`] |
//! | `cache_ttl_secs` | unset | Cache lifetime; unset caches until a write invalidates |
//!
//! Subdirectory depth is not configured here: each [`crate::kind::RecordKind`] carries
//! its own limit, used both to validate file names and to bound listings.

use crate::error::Result;
use confique::Config;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the store, stored in `themestore.toml`.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the themes. Falls back to the platform data directory.
    #[config(env = "THEMESTORE_THEMES_PATH")]
    pub themes_path: Option<PathBuf>,

    /// Name of the theme to open.
    #[config(env = "THEMESTORE_ACTIVE_THEME", default = "default")]
    pub active_theme: String,

    /// Seconds a cached select stays valid.
    #[config(env = "THEMESTORE_CACHE_TTL_SECS")]
    pub cache_ttl_secs: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            themes_path: None,
            active_theme: "default".to_string(),
            cache_ttl_secs: None,
        }
    }
}

impl StoreConfig {
    /// Load from the environment and, when given, a TOML file.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(file) = file {
            builder = builder.file(file);
        }
        Ok(builder.load()?)
    }

    /// The configured themes directory, or `{data_dir}/themes` for this platform.
    pub fn themes_path(&self) -> Option<PathBuf> {
        self.themes_path.clone().or_else(|| {
            ProjectDirs::from("", "", "themestore").map(|dirs| dirs.data_dir().join("themes"))
        })
    }
}
