use crate::value::{ResultSet, Row};
use async_trait::async_trait;
use thiserror::Error;

/// Failure of a single stage call.
#[derive(Debug, Clone, Error)]
pub enum StageError {
    /// Request never produced a response (connect, DNS, timeout).
    #[error("transport error: {0}")]
    Transport(String),
    /// Backend answered with a non-success status. `detail` is the
    /// structured message from the error payload when it carried one.
    #[error("api error (status {status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Api { status: u16, detail: Option<String> },
    /// Response arrived but its payload did not parse.
    #[error("parse error: {0}")]
    Parse(String),
}

impl StageError {
    /// The backend's structured error detail, if the failed call surfaced one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            StageError::Api { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// The three remote operations the pipeline sequences.
///
/// Implementations are opaque request/response calls; the pipeline owns all
/// ordering and state decisions.
#[async_trait]
pub trait StageClient: Send + Sync {
    /// Turn a natural-language question into query text.
    async fn generate_query(&self, question: &str) -> Result<String, StageError>;

    /// Run the generated query and return the result set.
    async fn execute_query(&self, query_text: &str) -> Result<ResultSet, StageError>;

    /// Produce a narrative summary of the result rows.
    async fn generate_insight(&self, rows: &[Row]) -> Result<String, StageError>;
}
