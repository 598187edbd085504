//! HTTP implementation of the stage client.

use crate::clients::traits::{StageClient, StageError};
use crate::config::Config;
use crate::error::Result;
use crate::value::{ResultSet, Row};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Serialize)]
struct GenerateQueryRequest<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
struct GenerateQueryResponse {
    query_text: String,
}

#[derive(Serialize)]
struct ExecuteQueryRequest<'a> {
    query_text: &'a str,
}

#[derive(Deserialize)]
struct ExecuteQueryResponse {
    #[serde(default)]
    columns: Vec<String>,
    // Absent data is the same terminal "no data" condition as an empty list.
    #[serde(default)]
    data: Vec<Row>,
}

#[derive(Serialize)]
struct GenerateInsightRequest<'a> {
    data: &'a [Row],
}

#[derive(Deserialize)]
struct GenerateInsightResponse {
    insight_text: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: String,
}

/// Pull the structured `detail` string out of an error payload, if present.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body).ok().map(|b| b.detail)
}

/// Stage client speaking JSON over HTTP to the backend API.
pub struct HttpStageClient {
    client: reqwest::Client,
    base_url: String,
    max_preview_rows: usize,
}

impl HttpStageClient {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: config.build_client()?,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            max_preview_rows: config.max_preview_rows,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> std::result::Result<R, StageError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path))
            .json(body)
            .send()
            .await
            .map_err(|e| StageError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(StageError::Api {
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| StageError::Parse(e.to_string()))
    }

    /// Probe the service root before starting a pipeline run.
    pub async fn health_check(&self) -> std::result::Result<(), StageError> {
        let root = self
            .base_url
            .strip_suffix("/api")
            .unwrap_or(self.base_url.as_str())
            .to_string();
        let response = self
            .client
            .get(root)
            .send()
            .await
            .map_err(|e| StageError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(StageError::Api {
                status: status.as_u16(),
                detail: None,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl StageClient for HttpStageClient {
    async fn generate_query(&self, question: &str) -> std::result::Result<String, StageError> {
        debug!("generate-query (question_len={})", question.len());
        let response: GenerateQueryResponse = self
            .post_json("generate-query", &GenerateQueryRequest { question })
            .await?;
        Ok(response.query_text)
    }

    async fn execute_query(&self, query_text: &str) -> std::result::Result<ResultSet, StageError> {
        debug!("execute-query (query_len={})", query_text.len());
        let response: ExecuteQueryResponse = self
            .post_json("execute-query", &ExecuteQueryRequest { query_text })
            .await?;
        Ok(ResultSet {
            columns: response.columns,
            rows: response.data,
        })
    }

    async fn generate_insight(&self, rows: &[Row]) -> std::result::Result<String, StageError> {
        // Cap the payload; the insight stage only previews the head anyway.
        let data = &rows[..rows.len().min(self.max_preview_rows)];
        debug!("generate-insight (rows={}, sent={})", rows.len(), data.len());
        let response: GenerateInsightResponse = self
            .post_json("generate-insight", &GenerateInsightRequest { data })
            .await?;
        Ok(response.insight_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_is_extracted_from_error_body() {
        assert_eq!(
            error_detail(r#"{"detail": "Only SELECT queries are allowed."}"#),
            Some("Only SELECT queries are allowed.".to_string())
        );
    }

    #[test]
    fn malformed_error_body_yields_no_detail() {
        assert_eq!(error_detail("Internal Server Error"), None);
        assert_eq!(error_detail(r#"{"message": "nope"}"#), None);
    }

    #[test]
    fn api_error_prefers_detail_in_display() {
        let err = StageError::Api {
            status: 400,
            detail: Some("bad query".into()),
        };
        assert_eq!(err.to_string(), "api error (status 400): bad query");
        assert_eq!(err.detail(), Some("bad query"));

        let bare = StageError::Api {
            status: 500,
            detail: None,
        };
        assert_eq!(bare.detail(), None);
    }
}
