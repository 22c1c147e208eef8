//! Experiment Log - one research experiment or assistant session

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::entries::{
    Category, Environment, ExperimentInput, ExperimentOutput, Interaction, InteractionType,
    TokenUsage,
};
use crate::id;

/// Experiment Log records one experiment, identified by `EXP-YYYY-MM-DD-NNN`.
///
/// Lists are append-only through the mutators; every mutator bumps
/// `version` by one and moves `updated_at` forward. The creation
/// `timestamp` never changes and is the search sort key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentLog {
    id: String,
    experiment_id: String,
    date: String,
    timestamp: i64,

    title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    category: Category,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    hypothesis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    methodology: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    environment: Option<Environment>,

    #[serde(default)]
    interactions: Vec<Interaction>,
    #[serde(default)]
    inputs: Vec<ExperimentInput>,
    #[serde(default)]
    outputs: Vec<ExperimentOutput>,
    #[serde(default)]
    observations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conclusions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    next_steps: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    related_papers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    related_experiments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    references: Option<Vec<String>>,

    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ExperimentLog {
    /// Build a fresh log from creation input, instant and daily sequence.
    ///
    /// The id and `date` use the calendar day of `now` in its own time
    /// zone; `created_at` and `updated_at` store the instant in UTC.
    #[must_use]
    pub fn create<Tz: TimeZone>(input: NewExperiment, now: DateTime<Tz>, sequence: u32) -> Self {
        let date = now.date_naive();
        let now = now.with_timezone(&Utc);
        Self {
            id: id::new_opaque_id(),
            experiment_id: id::experiment_id(date, sequence),
            date: date.format("%Y-%m-%d").to_string(),
            timestamp: now.timestamp_millis(),
            title: input.title,
            description: input.description,
            tags: input.tags,
            category: input.category,
            hypothesis: input.hypothesis,
            methodology: input.methodology,
            environment: None,
            interactions: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            observations: Vec::new(),
            conclusions: None,
            next_steps: None,
            related_papers: None,
            related_experiments: None,
            references: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a builder for the input of [`ExperimentLog::create`].
    #[must_use]
    pub fn builder(title: impl Into<String>, category: Category) -> NewExperiment {
        NewExperiment::new(title, category)
    }

    /// Get the opaque id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Get the `EXP-YYYY-MM-DD-NNN` id.
    #[must_use]
    pub fn experiment_id(&self) -> &str {
        &self.experiment_id
    }

    /// Get the creation date (`YYYY-MM-DD`).
    #[must_use]
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Get the creation instant in epoch milliseconds.
    #[must_use]
    pub const fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Get the title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Get the description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Get the tags.
    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Get the category.
    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Get the hypothesis, if any.
    #[must_use]
    pub fn hypothesis(&self) -> Option<&str> {
        self.hypothesis.as_deref()
    }

    /// Get the methodology, if any.
    #[must_use]
    pub fn methodology(&self) -> Option<&str> {
        self.methodology.as_deref()
    }

    /// Get the environment, if any.
    #[must_use]
    pub const fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }

    /// Get the recorded dialogue.
    #[must_use]
    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Get the inputs.
    #[must_use]
    pub fn inputs(&self) -> &[ExperimentInput] {
        &self.inputs
    }

    /// Get the outputs.
    #[must_use]
    pub fn outputs(&self) -> &[ExperimentOutput] {
        &self.outputs
    }

    /// Get the observations.
    #[must_use]
    pub fn observations(&self) -> &[String] {
        &self.observations
    }

    /// Get the conclusions, if set.
    #[must_use]
    pub fn conclusions(&self) -> Option<&str> {
        self.conclusions.as_deref()
    }

    /// Get the next steps, if set.
    #[must_use]
    pub fn next_steps(&self) -> Option<&[String]> {
        self.next_steps.as_deref()
    }

    /// Get related paper ids, if set.
    #[must_use]
    pub fn related_papers(&self) -> Option<&[String]> {
        self.related_papers.as_deref()
    }

    /// Get related experiment ids, if set.
    #[must_use]
    pub fn related_experiments(&self) -> Option<&[String]> {
        self.related_experiments.as_deref()
    }

    /// Get references, if set.
    #[must_use]
    pub fn references(&self) -> Option<&[String]> {
        self.references.as_deref()
    }

    /// Get the version (1 at creation).
    #[must_use]
    pub const fn version(&self) -> u32 {
        self.version
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Get the last-modification timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Text searched by free-text queries: title, description, hypothesis,
    /// observations and conclusions, space-joined and lower-cased.
    #[must_use]
    pub fn search_text(&self) -> String {
        let mut parts: Vec<&str> = vec![
            self.title.as_str(),
            self.description.as_deref().unwrap_or(""),
            self.hypothesis.as_deref().unwrap_or(""),
        ];
        parts.extend(self.observations.iter().map(String::as_str));
        parts.push(self.conclusions.as_deref().unwrap_or(""));
        parts.join(" ").to_lowercase()
    }

    /// Apply a block of field changes as one mutation.
    pub fn update(&mut self, changes: ExperimentChanges) {
        let ExperimentChanges {
            title,
            description,
            tags,
            hypothesis,
            methodology,
            environment,
            next_steps,
            related_papers,
            related_experiments,
            references,
        } = changes;

        if let Some(title) = title {
            self.title = title;
        }
        if description.is_some() {
            self.description = description;
        }
        if let Some(tags) = tags {
            self.tags = tags;
        }
        if hypothesis.is_some() {
            self.hypothesis = hypothesis;
        }
        if methodology.is_some() {
            self.methodology = methodology;
        }
        if environment.is_some() {
            self.environment = environment;
        }
        if next_steps.is_some() {
            self.next_steps = next_steps;
        }
        if related_papers.is_some() {
            self.related_papers = related_papers;
        }
        if related_experiments.is_some() {
            self.related_experiments = related_experiments;
        }
        if references.is_some() {
            self.references = references;
        }
        self.touch();
    }

    /// Append a dialogue turn with a fresh `INT-` id.
    pub fn add_interaction(
        &mut self,
        kind: InteractionType,
        content: impl Into<String>,
        model: Option<String>,
        tokens: Option<TokenUsage>,
    ) -> &Interaction {
        self.interactions.push(Interaction {
            id: id::short_id(id::INTERACTION_PREFIX),
            timestamp: Utc::now(),
            kind,
            content: content.into(),
            model,
            tokens,
        });
        self.touch();
        &self.interactions[self.interactions.len() - 1]
    }

    /// Append an input.
    pub fn add_input(&mut self, input: ExperimentInput) {
        self.inputs.push(input);
        self.touch();
    }

    /// Append an output.
    pub fn add_output(&mut self, output: ExperimentOutput) {
        self.outputs.push(output);
        self.touch();
    }

    /// Append an observation.
    pub fn add_observation(&mut self, observation: impl Into<String>) {
        self.observations.push(observation.into());
        self.touch();
    }

    /// Replace the conclusions.
    pub fn set_conclusions(&mut self, conclusions: impl Into<String>) {
        self.conclusions = Some(conclusions.into());
        self.touch();
    }

    fn touch(&mut self) {
        self.version += 1;
        // Clock steps backwards must not make updated_at regress.
        self.updated_at = Utc::now().max(self.updated_at);
    }
}

/// Input for creating an experiment; built via [`ExperimentLog::builder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExperiment {
    /// Required title.
    pub title: String,
    /// Required category.
    pub category: Category,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Tags (may be empty).
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional hypothesis.
    #[serde(default)]
    pub hypothesis: Option<String>,
    /// Optional methodology.
    #[serde(default)]
    pub methodology: Option<String>,
}

impl NewExperiment {
    /// Create a new builder with required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, category: Category) -> Self {
        Self {
            title: title.into(),
            category,
            description: None,
            tags: Vec::new(),
            hypothesis: None,
            methodology: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the tags.
    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set the hypothesis.
    #[must_use]
    pub fn hypothesis(mut self, hypothesis: impl Into<String>) -> Self {
        self.hypothesis = Some(hypothesis.into());
        self
    }

    /// Set the methodology.
    #[must_use]
    pub fn methodology(mut self, methodology: impl Into<String>) -> Self {
        self.methodology = Some(methodology.into());
        self
    }
}

/// Overwriting field changes applied by [`ExperimentLog::update`].
///
/// `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentChanges {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement tag list.
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// New hypothesis.
    #[serde(default)]
    pub hypothesis: Option<String>,
    /// New methodology.
    #[serde(default)]
    pub methodology: Option<String>,
    /// New environment.
    #[serde(default)]
    pub environment: Option<Environment>,
    /// Replacement next steps.
    #[serde(default)]
    pub next_steps: Option<Vec<String>>,
    /// Replacement related papers.
    #[serde(default)]
    pub related_papers: Option<Vec<String>>,
    /// Replacement related experiments.
    #[serde(default)]
    pub related_experiments: Option<Vec<String>>,
    /// Replacement references.
    #[serde(default)]
    pub references: Option<Vec<String>>,
}

impl ExperimentChanges {
    /// True if no field would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
