//! Name index: lower-cased entity name/alias -> short id.
//!
//! Loaded lazily on first use and kept for the lifetime of the store;
//! every mutation is flushed to `index.json` before returning. The file is
//! a cache of what the entity files say, so it can always be rebuilt from
//! a directory scan.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::debug;

use crate::{persist, Result};

pub(crate) type IndexMap = BTreeMap<String, String>;

#[derive(Debug)]
pub(crate) struct NameIndex {
    path: PathBuf,
    cache: Mutex<Option<IndexMap>>,
}

impl NameIndex {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    async fn load(&self) -> Result<IndexMap> {
        match persist::read_optional(&self.path).await? {
            Some(content) => Ok(serde_json::from_str(&content)?),
            None => Ok(IndexMap::new()),
        }
    }

    async fn save(&self, map: &IndexMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(map)?;
        persist::write_atomic(&self.path, json.as_bytes()).await?;
        debug!(entries = map.len(), path = %self.path.display(), "name index saved");
        Ok(())
    }

    /// Short id registered for `name` (compared lower-cased).
    pub(crate) async fn lookup(&self, name: &str) -> Result<Option<String>> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache
            .as_ref()
            .and_then(|map| map.get(&name.to_lowercase()).cloned()))
    }

    /// Whether every key already points at `short_id`.
    pub(crate) async fn covers(&self, keys: &[String], short_id: &str) -> Result<bool> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.as_ref().is_some_and(|map| {
            keys.iter()
                .all(|key| map.get(&key.to_lowercase()).is_some_and(|id| id == short_id))
        }))
    }

    /// Point every key at `short_id` and persist; `stale` keys currently
    /// pointing at `short_id` are dropped first.
    pub(crate) async fn assign(&self, keys: &[String], stale: &[String], short_id: &str) -> Result<()> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        let Some(map) = cache.as_mut() else {
            return Ok(());
        };

        for key in stale {
            if map.get(key).is_some_and(|id| id == short_id) {
                map.remove(key);
            }
        }
        for key in keys {
            map.insert(key.to_lowercase(), short_id.to_string());
        }
        self.save(map).await
    }

    /// Replace the whole index and persist it.
    pub(crate) async fn replace(&self, map: IndexMap) -> Result<()> {
        let mut cache = self.cache.lock().await;
        self.save(&map).await?;
        *cache = Some(map);
        Ok(())
    }

    /// Copy of the current index.
    pub(crate) async fn snapshot(&self) -> Result<IndexMap> {
        let mut cache = self.cache.lock().await;
        if cache.is_none() {
            *cache = Some(self.load().await?);
        }
        Ok(cache.clone().unwrap_or_default())
    }
}
