//! Experiment logging
//!
//! An [`ExperimentLog`] captures one research experiment or assistant
//! session: what was tried, the dialogue that happened, inputs, outputs,
//! observations and conclusions.
//!
//! ## Schema Overview
//!
//! ```text
//! ExperimentLog (EXP-YYYY-MM-DD-NNN)
//!     ├──< Interaction (N)        [INT-xxxxxxxx, append-only]
//!     ├──< ExperimentInput (N)    [append-only]
//!     ├──< ExperimentOutput (N)   [append-only]
//!     └──< observation (N)        [append-only]
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use aria_store::experiment::{Category, ExperimentLog, ExperimentStore, ExperimentUpdate};
//!
//! # async fn example() -> aria_store::Result<()> {
//! let store = ExperimentStore::new("storage/experiments");
//!
//! let log = store
//!     .create(ExperimentLog::builder("LoRA rank sweep", Category::ModelTraining).tags(["lora"]))
//!     .await?;
//!
//! let log = store
//!     .update(log.experiment_id(), ExperimentUpdate::observations(["rank 8 is enough"]))
//!     .await?;
//! assert_eq!(log.version(), 2);
//! # Ok(())
//! # }
//! ```

mod entries;
mod experiment_log;
mod filter;
mod store;

pub use entries::{
    Category, Environment, ExperimentInput, ExperimentOutput, InputKind, Interaction,
    InteractionType, OutputKind, TokenUsage,
};
pub use experiment_log::{ExperimentChanges, ExperimentLog, NewExperiment};
pub use filter::{ExperimentFilters, ExperimentUpdate, NewInteraction};
pub use store::{ExperimentSearchResult, ExperimentStore};
