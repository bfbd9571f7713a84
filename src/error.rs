//! Error types for loading and analysing billing data.

use thiserror::Error;

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Errors surfaced by the analysis pipeline.
///
/// Only `NoRows` comes out of the computation itself; everything else is
/// raised while reading input or validating configuration.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No rows found in CSV")]
    NoRows,

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },
}

impl AnalysisError {
    pub(crate) fn invalid_config(field: &str, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidConfig {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
