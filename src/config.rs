//! Storage configuration
//!
//! Loaded in layers: built-in defaults, then an optional TOML file (path
//! from `ARIA_CONFIG`, default `config/aria`), then `ARIA_*` environment
//! variables. `ARIA_STORAGE_PATH` therefore moves the whole storage root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;

/// Default number of results returned by a search.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Storage settings shared by both stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory under which the `storage/` tree is created.
    pub storage_path: PathBuf,
    /// Result cap for searches when the caller gives none.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

const fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl StorageConfig {
    /// Config rooted at `storage_path` with default limits.
    #[must_use]
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Load config from file and environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is malformed or a value has the
    /// wrong type.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("ARIA_CONFIG").unwrap_or_else(|_| "config/aria".to_string());
        let cwd = std::env::current_dir()?;

        let builder = ::config::Config::builder()
            .set_default("storage_path", cwd.to_string_lossy().into_owned())?
            .set_default("search_limit", DEFAULT_SEARCH_LIMIT as i64)?
            .add_source(::config::File::with_name(&config_path).required(false))
            .add_source(::config::Environment::with_prefix("ARIA").try_parsing(true));

        let config: Self = builder.build()?.try_deserialize()?;
        tracing::debug!(root = %config.root().display(), "storage config loaded");
        Ok(config)
    }

    /// Root of the storage tree (`{storage_path}/storage`).
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.storage_path.join("storage")
    }

    /// Base directory of the experiment store.
    #[must_use]
    pub fn experiments_dir(&self) -> PathBuf {
        self.root().join("experiments")
    }

    /// Base directory of the knowledge store.
    #[must_use]
    pub fn knowledge_dir(&self) -> PathBuf {
        self.root().join("knowledge")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let config = StorageConfig::new("/data/aria");
        assert_eq!(config.root(), PathBuf::from("/data/aria/storage"));
        assert_eq!(
            config.experiments_dir(),
            PathBuf::from("/data/aria/storage/experiments")
        );
        assert_eq!(
            config.knowledge_dir(),
            PathBuf::from("/data/aria/storage/knowledge")
        );
    }

    #[test]
    fn test_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.search_limit, 10);
    }

    #[test]
    fn test_deserialize_fills_limit() {
        let config: StorageConfig =
            serde_json::from_str(r#"{"storage_path": "/tmp/x"}"#).unwrap();
        assert_eq!(config.search_limit, DEFAULT_SEARCH_LIMIT);
    }
}
