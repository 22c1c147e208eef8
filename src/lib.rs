//! # aria-store: File-Backed Research Memory
//!
//! **Version**: 0.1.0
//!
//! aria-store persists the working memory of a research assistant as plain
//! files: experiment logs as date-partitioned YAML, and a knowledge graph of
//! concepts, methods, findings and relations as JSON, with a name index for
//! direct lookup.
//!
//! ## Storage Layout
//!
//! ```text
//! {storage_path}/storage/
//!     ├── experiments/YYYY/MM/DD/EXP-YYYY-MM-DD-NNN.yaml
//!     └── knowledge/
//!           ├── entities/{concept,method,finding}/KN-xxxxxxxx.json
//!           ├── relations/REL-xxxxxxxx.json
//!           └── index.json
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use aria_store::experiment::{Category, ExperimentLog, ExperimentStore};
//! use aria_store::knowledge::{AddKnowledge, KnowledgeStore};
//! use aria_store::StorageConfig;
//!
//! # async fn example() -> aria_store::Result<()> {
//! let config = StorageConfig::load()?;
//! let experiments = ExperimentStore::from_config(&config);
//! let knowledge = KnowledgeStore::from_config(&config);
//!
//! experiments
//!     .create(ExperimentLog::builder("Baseline run", Category::ModelTraining))
//!     .await?;
//! knowledge
//!     .add(AddKnowledge::method("Warmup", "Linear learning-rate warmup"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod error;
pub mod experiment;
pub mod id;
pub mod knowledge;
mod persist;
pub mod tools;

pub use crate::config::StorageConfig;
pub use error::{Error, ErrorKind, Result};
pub use experiment::ExperimentStore;
pub use knowledge::KnowledgeStore;
pub use tools::Toolkit;
