//! Experiment Store - one YAML file per experiment log
//!
//! ```text
//! {base}/YYYY/MM/DD/EXP-YYYY-MM-DD-NNN.yaml
//! ```
//!
//! Records are partitioned by creation date; the `NNN` suffix comes from a
//! per-date sequence allocator.

use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use dashmap::DashMap;
use tokio::fs;
use tracing::{debug, info, warn};

use super::filter::{ExperimentFilters, ExperimentUpdate};
use super::{ExperimentLog, NewExperiment};
use crate::config::StorageConfig;
use crate::{id, persist, Error, Result};

const EXTENSION: &str = "yaml";
const MAX_SEQUENCE: u32 = 999;
const MAX_CREATE_ATTEMPTS: usize = 16;

/// Result of a search: the page of logs plus the pre-truncation match count.
#[derive(Debug, Clone, PartialEq)]
pub struct ExperimentSearchResult {
    /// Matching logs, newest first, at most `limit`.
    pub experiments: Vec<ExperimentLog>,
    /// Number of matching logs before truncation.
    pub total: usize,
}

/// File-backed store for experiment logs.
///
/// ## Sequence allocation
///
/// The first allocation for a date scans that day's directory for the
/// highest `NNN`; later allocations increment an in-process cache. Files
/// are created exclusively, so when another process (or a racing caller)
/// already wrote the allocated id, the cache is reseeded from disk and the
/// allocation retried instead of overwriting the existing record.
#[derive(Debug)]
pub struct ExperimentStore {
    base_path: PathBuf,
    sequences: DashMap<String, u32>,
}

impl ExperimentStore {
    /// Create a store rooted at `base_path`. Nothing is created on disk
    /// until the first write.
    #[must_use]
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            sequences: DashMap::new(),
        }
    }

    /// Create a store at the configured experiments directory.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.experiments_dir())
    }

    /// Get the base directory.
    #[must_use]
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path of an experiment id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] if the id is malformed.
    pub fn path_for(&self, experiment_id: &str) -> Result<PathBuf> {
        let key = id::parse_experiment_id(experiment_id)?;
        Ok(self
            .base_path
            .join(&key.year)
            .join(&key.month)
            .join(&key.day)
            .join(format!("{experiment_id}.{EXTENSION}")))
    }

    fn day_dir(&self, date: NaiveDate) -> PathBuf {
        self.base_path
            .join(date.format("%Y").to_string())
            .join(date.format("%m").to_string())
            .join(date.format("%d").to_string())
    }

    /// Create and persist a new experiment dated today in the local time
    /// zone.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialized.
    pub async fn create(&self, input: NewExperiment) -> Result<ExperimentLog> {
        self.create_at(input, Local::now()).await
    }

    /// Create and persist a new experiment with an explicit creation
    /// instant. The calendar day of `now` in its own time zone decides the
    /// id, the directory and the sequence counter.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialized, or if
    /// no free sequence number is left for the date.
    pub async fn create_at<Tz: TimeZone>(&self, input: NewExperiment, now: DateTime<Tz>) -> Result<ExperimentLog> {
        let date = now.date_naive();
        let dir = self.day_dir(date);
        fs::create_dir_all(&dir).await?;

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let sequence = self.next_sequence(date).await?;
            if sequence > MAX_SEQUENCE {
                return Err(Error::Other(format!(
                    "Failed to create experiment: sequence exhausted for {date}"
                )));
            }

            let log = ExperimentLog::create(input.clone(), now.clone(), sequence);
            let path = dir.join(format!("{}.{EXTENSION}", log.experiment_id()));
            let yaml = serde_yaml::to_string(&log)?;

            match persist::write_new(&path, yaml.as_bytes()).await {
                Ok(()) => {
                    info!(experiment_id = log.experiment_id(), title = log.title(), "experiment created");
                    return Ok(log);
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    warn!(experiment_id = log.experiment_id(), "experiment id taken on disk, reseeding sequence");
                    self.reseed(date).await?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(Error::Other(format!(
            "Failed to create experiment: no free id for {date} after {MAX_CREATE_ATTEMPTS} attempts"
        )))
    }

    /// Read an experiment by id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidId`] for a malformed id, [`Error::NotFound`]
    /// if no file exists, or an IO/YAML error.
    pub async fn get(&self, experiment_id: &str) -> Result<ExperimentLog> {
        let path = self.path_for(experiment_id)?;
        debug!(path = %path.display(), "reading experiment");

        let content = persist::read_optional(&path)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Experiment not found: {experiment_id}")))?;
        Ok(serde_yaml::from_str(&content)?)
    }

    /// Apply `patch` to an experiment and rewrite its file.
    ///
    /// The patch is applied to an in-memory copy and written once; on any
    /// error nothing is persisted. The id, date and location never change.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get), plus write failures.
    pub async fn update(&self, experiment_id: &str, patch: ExperimentUpdate) -> Result<ExperimentLog> {
        let mut log = self.get(experiment_id).await?;
        patch.apply_to(&mut log);

        let yaml = serde_yaml::to_string(&log)?;
        persist::write_atomic(&self.path_for(experiment_id)?, yaml.as_bytes()).await?;

        info!(experiment_id, version = log.version(), "experiment updated");
        Ok(log)
    }

    /// Scan all experiments, newest first.
    ///
    /// Day directories outside the date range are skipped without being
    /// read. Sorting uses the creation `timestamp`, so updates never move a
    /// record.
    ///
    /// # Errors
    ///
    /// Returns an error if a directory cannot be listed or a file cannot be
    /// read or parsed.
    pub async fn search(&self, filters: &ExperimentFilters, limit: usize) -> Result<ExperimentSearchResult> {
        let mut experiments = Vec::new();

        for (year, year_path) in persist::subdirectories(&self.base_path).await? {
            for (month, month_path) in persist::subdirectories(&year_path).await? {
                for (day, day_path) in persist::subdirectories(&month_path).await? {
                    let date = format!("{year}-{month}-{day}");
                    if !filters.includes_date(&date) {
                        continue;
                    }

                    for (_, file) in persist::files_with_extension(&day_path, EXTENSION).await? {
                        let content = fs::read_to_string(&file).await?;
                        let log: ExperimentLog = serde_yaml::from_str(&content)?;
                        if filters.matches(&log) {
                            experiments.push(log);
                        }
                    }
                }
            }
        }

        experiments.sort_by(|a, b| b.timestamp().cmp(&a.timestamp()));
        let total = experiments.len();
        experiments.truncate(limit);

        debug!(total, returned = experiments.len(), "experiment search");
        Ok(ExperimentSearchResult { experiments, total })
    }

    /// The newest `limit` experiments.
    ///
    /// # Errors
    ///
    /// Same as [`search`](Self::search).
    pub async fn list(&self, limit: usize) -> Result<ExperimentSearchResult> {
        self.search(&ExperimentFilters::default(), limit).await
    }

    async fn next_sequence(&self, date: NaiveDate) -> Result<u32> {
        let key = date.format("%Y-%m-%d").to_string();
        if let Some(mut next) = self.sequences.get_mut(&key) {
            *next += 1;
            return Ok(*next);
        }

        let max = scan_max_sequence(&self.day_dir(date)).await?;
        // A racing caller may have seeded the entry while we scanned.
        let next = *self
            .sequences
            .entry(key)
            .and_modify(|n| *n += 1)
            .or_insert(max + 1);
        Ok(next)
    }

    async fn reseed(&self, date: NaiveDate) -> Result<()> {
        let max = scan_max_sequence(&self.day_dir(date)).await?;
        self.sequences
            .entry(date.format("%Y-%m-%d").to_string())
            .and_modify(|n| *n = (*n).max(max))
            .or_insert(max);
        Ok(())
    }
}

/// Highest `NNN` among `EXP-YYYY-MM-DD-NNN.yaml` files in `dir`, 0 if none.
async fn scan_max_sequence(dir: &Path) -> Result<u32> {
    let files = persist::files_with_extension(dir, EXTENSION).await?;
    let max = files
        .iter()
        .filter_map(|(name, _)| name.strip_suffix(&format!(".{EXTENSION}")))
        .filter_map(|stem| id::parse_experiment_id(stem).ok())
        .map(|key| key.sequence)
        .max()
        .unwrap_or(0);
    debug!(dir = %dir.display(), max, "scanned experiment sequence");
    Ok(max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::experiment::Category;
    use chrono::Utc;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_path_for_layout() {
        let store = ExperimentStore::new("/base");
        assert_eq!(
            store.path_for("EXP-2026-01-28-001").unwrap(),
            PathBuf::from("/base/2026/01/28/EXP-2026-01-28-001.yaml")
        );
        assert!(matches!(store.path_for("nope"), Err(Error::InvalidId(_))));
    }

    #[tokio::test]
    async fn test_sequence_scans_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        let day = dir.path().join("2026/01/15");
        fs::create_dir_all(&day).await.unwrap();
        fs::write(day.join("EXP-2026-01-15-007.yaml"), "x").await.unwrap();
        fs::write(day.join("notes.txt"), "x").await.unwrap();

        let store = ExperimentStore::new(dir.path());
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        assert_eq!(store.next_sequence(date).await.unwrap(), 8);
        assert_eq!(store.next_sequence(date).await.unwrap(), 9);
    }

    #[tokio::test]
    async fn test_create_skips_ids_taken_behind_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExperimentStore::new(dir.path());
        let first = store
            .create_at(NewExperiment::new("one", Category::Other), at(2026, 1, 15))
            .await
            .unwrap();
        assert_eq!(first.experiment_id(), "EXP-2026-01-15-001");

        // Another process writes -002 without this store knowing.
        let day = dir.path().join("2026/01/15");
        fs::write(day.join("EXP-2026-01-15-002.yaml"), "foreign").await.unwrap();

        let second = store
            .create_at(NewExperiment::new("two", Category::Other), at(2026, 1, 15))
            .await
            .unwrap();
        assert_eq!(second.experiment_id(), "EXP-2026-01-15-003");
        assert_eq!(
            fs::read_to_string(day.join("EXP-2026-01-15-002.yaml")).await.unwrap(),
            "foreign"
        );
    }

    #[tokio::test]
    async fn test_search_on_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ExperimentStore::new(dir.path().join("missing"));
        let result = store.list(10).await.unwrap();
        assert_eq!(result.total, 0);
        assert!(result.experiments.is_empty());
    }
}
