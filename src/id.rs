//! Identifier generation
//!
//! Three shapes of identifier are used across the stores:
//!
//! ```text
//! 0b6f1c1e-5d1a-4c8e-9b7a-2f0e3d4c5b6a   opaque id (UUID v4), `id` fields
//! EXP-2026-01-28-001                     experiment id (date + daily sequence)
//! KN-0b6f1c1e / REL-… / INT-…            short id (prefix + 8 hex chars)
//! ```
//!
//! Short ids carry ~32 bits of randomness; callers that persist them are
//! responsible for checking collisions against existing files.

use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{Error, Result};

/// Prefix for knowledge entity short ids.
pub const KNOWLEDGE_PREFIX: &str = "KN";
/// Prefix for relation short ids.
pub const RELATION_PREFIX: &str = "REL";
/// Prefix for dialogue interaction short ids.
pub const INTERACTION_PREFIX: &str = "INT";

/// Generate a random opaque identifier (UUID v4, hyphenated).
#[must_use]
pub fn new_opaque_id() -> String {
    Uuid::new_v4().to_string()
}

/// Format an experiment id from a creation date and a daily sequence.
///
/// The sequence is zero-padded to three digits; larger values are written
/// in full and will not be picked up by [`parse_experiment_id`].
#[must_use]
pub fn experiment_id(date: NaiveDate, sequence: u32) -> String {
    format!(
        "EXP-{:04}-{:02}-{:02}-{:03}",
        date.year(),
        date.month(),
        date.day(),
        sequence
    )
}

/// Generate `{prefix}-{first 8 hex chars of a fresh UUID}`.
#[must_use]
pub fn short_id(prefix: &str) -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &uuid[..8])
}

/// Whether `candidate` has the exact shape [`short_id`] produces for
/// `prefix`: the prefix, a hyphen and eight lower-case hex digits.
#[must_use]
pub fn is_short_id(prefix: &str, candidate: &str) -> bool {
    candidate
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| {
            hex.len() == 8 && hex.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        })
}

/// Components of a parsed `EXP-YYYY-MM-DD-NNN` identifier.
///
/// Date parts are kept as the original digit strings since they map
/// one-to-one onto the storage directory names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentKey {
    /// Four-digit year
    pub year: String,
    /// Two-digit month
    pub month: String,
    /// Two-digit day
    pub day: String,
    /// Daily sequence number
    pub sequence: u32,
}

impl ExperimentKey {
    /// The `YYYY-MM-DD` date string of this key.
    #[must_use]
    pub fn date(&self) -> String {
        format!("{}-{}-{}", self.year, self.month, self.day)
    }
}

/// Parse an experiment id of the exact form `EXP-YYYY-MM-DD-NNN`.
///
/// # Errors
///
/// Returns [`Error::InvalidId`] if the id does not match the format.
pub fn parse_experiment_id(experiment_id: &str) -> Result<ExperimentKey> {
    let invalid = || Error::InvalidId(experiment_id.to_string());

    let rest = experiment_id.strip_prefix("EXP-").ok_or_else(invalid)?;
    let parts: Vec<&str> = rest.split('-').collect();
    let [year, month, day, seq] = parts[..] else {
        return Err(invalid());
    };

    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
    if !(digits(year, 4) && digits(month, 2) && digits(day, 2) && digits(seq, 3)) {
        return Err(invalid());
    }

    Ok(ExperimentKey {
        year: year.to_string(),
        month: month.to_string(),
        day: day.to_string(),
        sequence: seq.parse().map_err(|_| invalid())?,
    })
}
