//! Value types recorded inside an experiment log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Research activity an experiment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Formulating or testing a hypothesis.
    Hypothesis,
    /// Gathering data.
    DataCollection,
    /// Analysing results.
    Analysis,
    /// Plotting and visual exploration.
    Visualization,
    /// Training a model.
    ModelTraining,
    /// Evaluating a model or method.
    Evaluation,
    /// Anything else.
    Other,
}

impl Category {
    /// On-disk name of the category.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hypothesis => "hypothesis",
            Self::DataCollection => "data-collection",
            Self::Analysis => "analysis",
            Self::Visualization => "visualization",
            Self::ModelTraining => "model-training",
            Self::Evaluation => "evaluation",
            Self::Other => "other",
        }
    }
}

/// Kind of a recorded assistant dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    /// Prompt sent to the assistant.
    Prompt,
    /// Assistant answer.
    Response,
    /// Code produced or run.
    Code,
    /// Error raised during the exchange.
    Error,
}

/// Token counts of one dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens.
    pub prompt: u64,
    /// Completion tokens.
    pub completion: u64,
}

/// One timestamped dialogue record (`INT-xxxxxxxx`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    /// Short interaction id.
    pub id: String,
    /// When the interaction was recorded.
    pub timestamp: DateTime<Utc>,
    /// Turn kind.
    #[serde(rename = "type")]
    pub kind: InteractionType,
    /// Free-text content.
    pub content: String,
    /// Model that produced the turn, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token accounting, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<TokenUsage>,
}

/// Kind of an experiment input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputKind {
    /// Input file.
    File,
    /// Scalar parameter.
    Parameter,
    /// Inline data.
    Data,
    /// Reference to an external resource.
    Reference,
}

/// A named input of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentInput {
    /// Input name.
    pub name: String,
    /// Input kind.
    #[serde(rename = "type")]
    pub kind: InputKind,
    /// String, number, boolean or object value.
    pub value: serde_json::Value,
    /// Where the input came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Free-text description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ExperimentInput {
    /// Input with no source or description.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: InputKind, value: impl Into<serde_json::Value>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            source: None,
            description: None,
        }
    }
}

/// Kind of an experiment output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Output file.
    File,
    /// Measured metric.
    Metric,
    /// Plot or figure.
    Visualization,
    /// Trained model.
    Model,
}

/// A named output of an experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutput {
    /// Output name.
    pub name: String,
    /// Output kind.
    #[serde(rename = "type")]
    pub kind: OutputKind,
    /// String, number or object value.
    pub value: serde_json::Value,
    /// Location of the output artifact.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Unit of a metric value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl ExperimentOutput {
    /// Output with no path or unit.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: OutputKind,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            path: None,
            unit: None,
        }
    }
}

/// Free-form description of the tooling an experiment ran with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    /// LLM provider name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    /// LLM model name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    /// Tools available to the assistant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}
