//! Error types for aria-store
//!
//! Every store operation returns [`Result`]; the message carries enough
//! context to be shown to a tool caller as-is.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of a failure, as seen by a tool caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed identifier or missing/invalid arguments
    InvalidInput,
    /// Direct lookup of a record that does not exist
    NotFound,
    /// Filesystem, serialization or configuration failure
    Io,
}

/// aria-store error types
#[derive(Error, Debug)]
pub enum Error {
    /// Identifier does not follow its fixed format
    #[error("Invalid experiment ID format: {0}")]
    InvalidId(String),

    /// Missing or inconsistent arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record does not exist (message already names the record kind)
    #[error("{0}")]
    NotFound(String),

    /// Tool name not registered with the toolkit
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (experiment file) encode/decode error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON (knowledge file, index, tool payload) encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Classify this error for the tool-dispatch boundary.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidId(_) | Self::InvalidInput(_) | Self::UnknownTool(_) => {
                ErrorKind::InvalidInput
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Io(_) | Self::Yaml(_) | Self::Json(_) | Self::Config(_) | Self::Other(_) => {
                ErrorKind::Io
            }
        }
    }
}
