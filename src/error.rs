//! Domain-specific error types for insightgen

use thiserror::Error;

/// Main error type for the insightgen pipeline
#[derive(Error, Debug)]
pub enum InsightGenError {
    #[error("Query generation failed: {message}")]
    Generation { message: String },

    #[error("Query execution failed: {message}")]
    Execution { message: String },

    /// Execution succeeded but returned no rows. Distinct from a transport
    /// failure; the display text is the exact message shown to the user.
    #[error("No data found for this query")]
    EmptyResult,

    /// Insight generation failed. Diagnostic only; never shown to the user
    /// and never flips the pipeline into a failed state.
    #[error("Insight generation failed: {message}")]
    Insight { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<serde_json::Error> for InsightGenError {
    fn from(err: serde_json::Error) -> Self {
        InsightGenError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for InsightGenError {
    fn from(err: reqwest::Error) -> Self {
        InsightGenError::Config {
            message: format!("HTTP client error: {}", err),
        }
    }
}

/// Result type alias for insightgen operations
pub type Result<T> = std::result::Result<T, InsightGenError>;
