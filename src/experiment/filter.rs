//! Search filters and update patches for the experiment store

use serde::{Deserialize, Serialize};

use super::entries::{Category, ExperimentInput, ExperimentOutput, InteractionType, TokenUsage};
use super::experiment_log::{ExperimentChanges, ExperimentLog};

/// Filters for [`ExperimentStore::search`](super::ExperimentStore::search).
///
/// Applied in order: date range (per day directory), category, tags (all
/// requested tags must be present), then a case-insensitive substring match
/// over the log's [`search_text`](ExperimentLog::search_text). Empty
/// strings and empty lists do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentFilters {
    /// Free-text query.
    #[serde(default)]
    pub query: Option<String>,
    /// Required tags.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Required category.
    #[serde(default)]
    pub category: Option<Category>,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_from: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_to: Option<String>,
}

impl ExperimentFilters {
    /// Whether a day directory's `YYYY-MM-DD` date is inside the range.
    ///
    /// Comparison is lexicographic on the strings.
    #[must_use]
    pub fn includes_date(&self, date: &str) -> bool {
        let after_start = non_empty(self.date_from.as_deref()).map_or(true, |from| date >= from);
        let before_end = non_empty(self.date_to.as_deref()).map_or(true, |to| date <= to);
        after_start && before_end
    }

    /// Whether a log passes the category, tag and query filters.
    #[must_use]
    pub fn matches(&self, log: &ExperimentLog) -> bool {
        if self.category.is_some_and(|category| category != log.category()) {
            return false;
        }

        if let Some(tags) = self.tags.as_deref().filter(|t| !t.is_empty()) {
            if !tags.iter().all(|tag| log.tags().contains(tag)) {
                return false;
            }
        }

        if let Some(query) = non_empty(self.query.as_deref()) {
            if !log.search_text().contains(&query.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.is_empty())
}

/// A dialogue turn to append via [`ExperimentUpdate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewInteraction {
    /// Turn kind.
    #[serde(rename = "type")]
    pub kind: InteractionType,
    /// Free-text content.
    pub content: String,
    /// Model name, if known.
    #[serde(default)]
    pub model: Option<String>,
    /// Token accounting, if known.
    #[serde(default)]
    pub tokens: Option<TokenUsage>,
}

/// Patch for [`ExperimentStore::update`](super::ExperimentStore::update).
///
/// List items are appended one mutator call at a time, so `version` grows
/// by one per item; conclusions and the field-change block count once
/// each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentUpdate {
    /// Inputs to append.
    #[serde(default)]
    pub inputs: Vec<ExperimentInput>,
    /// Outputs to append.
    #[serde(default)]
    pub outputs: Vec<ExperimentOutput>,
    /// Observations to append.
    #[serde(default)]
    pub observations: Vec<String>,
    /// Dialogue turns to append.
    #[serde(default)]
    pub interactions: Vec<NewInteraction>,
    /// Replacement conclusions; an empty string is ignored.
    #[serde(default)]
    pub conclusions: Option<String>,
    /// Overwriting field changes.
    #[serde(flatten)]
    pub changes: ExperimentChanges,
}

impl ExperimentUpdate {
    /// Patch that appends observations only.
    #[must_use]
    pub fn observations<I, S>(observations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            observations: observations.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Apply every part of the patch to `log`.
    pub fn apply_to(self, log: &mut ExperimentLog) {
        for input in self.inputs {
            log.add_input(input);
        }
        for output in self.outputs {
            log.add_output(output);
        }
        for observation in self.observations {
            log.add_observation(observation);
        }
        for interaction in self.interactions {
            log.add_interaction(
                interaction.kind,
                interaction.content,
                interaction.model,
                interaction.tokens,
            );
        }
        if let Some(conclusions) = self.conclusions.filter(|c| !c.is_empty()) {
            log.set_conclusions(conclusions);
        }
        if !self.changes.is_empty() {
            log.update(self.changes);
        }
    }
}
