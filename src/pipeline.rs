//! The pipeline orchestrator and its externally observable state.
//!
//! One submission walks three remote stages in order: generate the query,
//! execute it, then summarize the rows. The first two are sequential and
//! terminal on failure; the insight stage is detached and never gates or
//! fails the pipeline. All visible state funnels through
//! [`PresentationState`], mutated only here.

use crate::chart::{self, ChartEncoding};
use crate::clients::{StageClient, StageError};
use crate::error::{InsightGenError, Result};
use crate::value::{ResultSet, Row};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

const GENERIC_ERROR: &str = "An unexpected error occurred.";

/// The single source of truth for what progress indicator and which error,
/// if any, is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    #[default]
    Idle,
    GeneratingQuery,
    ExecutingQuery,
    AnalyzingResult,
    Done,
    Failed,
}

impl PipelineStage {
    /// Done and Failed end a submission; only a new submit leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done | PipelineStage::Failed)
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            PipelineStage::Idle => "Idle",
            PipelineStage::GeneratingQuery => "Generating query...",
            PipelineStage::ExecutingQuery => "Executing query...",
            PipelineStage::AnalyzingResult => "Analyzing data...",
            PipelineStage::Done => "Done",
            PipelineStage::Failed => "Failed",
        };
        f.write_str(label)
    }
}

/// Snapshot of everything downstream rendering reads.
#[derive(Debug, Clone, Default)]
pub struct PresentationState {
    pub stage: PipelineStage,
    pub query_text: Option<String>,
    pub result: Option<ResultSet>,
    pub insight: Option<String>,
    pub error: Option<String>,
}

impl PresentationState {
    /// Chart encoding derived from the current result set. Never stored;
    /// recomputed on every read.
    pub fn chart_encoding(&self) -> Option<ChartEncoding> {
        self.result
            .as_ref()
            .and_then(|r| chart::first_row_encoding(&r.rows))
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.stage,
            PipelineStage::GeneratingQuery
                | PipelineStage::ExecutingQuery
                | PipelineStage::AnalyzingResult
        )
    }

    /// True while a published result set is still waiting on its insight.
    pub fn insight_pending(&self) -> bool {
        self.result.is_some() && self.insight.is_none() && self.stage != PipelineStage::Failed
    }
}

/// Message shown to the user for a failed stage call: the backend's
/// structured detail when the payload carried one, else a generic fallback.
fn user_error(err: &StageError) -> String {
    err.detail()
        .map(str::to_string)
        .unwrap_or_else(|| GENERIC_ERROR.to_string())
}

/// Drives the three stages in order and owns the visible state machine.
pub struct PipelineOrchestrator<C: StageClient + 'static> {
    client: Arc<C>,
    state: Arc<RwLock<PresentationState>>,
    submission: Arc<AtomicU64>,
}

impl<C: StageClient + 'static> PipelineOrchestrator<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            state: Arc::new(RwLock::new(PresentationState::default())),
            submission: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current state, cloned.
    pub async fn snapshot(&self) -> PresentationState {
        self.state.read().await.clone()
    }

    /// Run one question through the pipeline.
    ///
    /// A whitespace-only question is a no-op: no state change, no remote
    /// calls. Otherwise prior results are cleared up front and every
    /// transition is visible through [`snapshot`](Self::snapshot) as it
    /// happens. The returned error mirrors what the state already shows;
    /// insight failures are absorbed and never surface here.
    pub async fn submit(&self, question: &str) -> Result<()> {
        let question = question.trim();
        if question.is_empty() {
            debug!("ignoring empty question");
            return Ok(());
        }

        let id = self.submission.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "pipeline start (submission={}, question_len={})",
            id,
            question.len()
        );
        {
            let mut state = self.state.write().await;
            *state = PresentationState {
                stage: PipelineStage::GeneratingQuery,
                ..PresentationState::default()
            };
        }

        let query_text = match self.client.generate_query(question).await {
            Ok(text) => text,
            Err(err) => {
                warn!("query generation failed (submission={}): {}", id, err);
                self.fail(user_error(&err)).await;
                return Err(InsightGenError::Generation {
                    message: err.to_string(),
                });
            }
        };
        {
            let mut state = self.state.write().await;
            state.query_text = Some(query_text.clone());
            state.stage = PipelineStage::ExecutingQuery;
        }

        let result = match self.client.execute_query(&query_text).await {
            Ok(result) => result,
            Err(err) => {
                // The generated query stays visible alongside the error.
                warn!("query execution failed (submission={}): {}", id, err);
                self.fail(user_error(&err)).await;
                return Err(InsightGenError::Execution {
                    message: err.to_string(),
                });
            }
        };

        if result.rows.is_empty() {
            info!("query returned no rows (submission={})", id);
            self.fail(InsightGenError::EmptyResult.to_string()).await;
            return Err(InsightGenError::EmptyResult);
        }

        {
            let mut state = self.state.write().await;
            state.result = Some(result.clone());
            state.stage = PipelineStage::AnalyzingResult;
        }

        // The insight request runs detached; Done is not gated on it.
        self.spawn_insight(id, result.rows.clone());

        {
            let mut state = self.state.write().await;
            state.stage = PipelineStage::Done;
        }
        info!(
            "pipeline done (submission={}, rows={})",
            id,
            result.row_count()
        );
        Ok(())
    }

    async fn fail(&self, message: String) {
        let mut state = self.state.write().await;
        state.error = Some(message);
        state.stage = PipelineStage::Failed;
    }

    fn spawn_insight(&self, id: u64, rows: Vec<Row>) {
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        let submission = Arc::clone(&self.submission);
        tokio::spawn(async move {
            match client.generate_insight(&rows).await {
                Ok(text) => {
                    let mut state = state.write().await;
                    // A completion from a superseded submission is dropped
                    // instead of overwriting the current result's insight.
                    if submission.load(Ordering::SeqCst) == id {
                        state.insight = Some(text);
                    } else {
                        debug!("discarding insight from superseded submission {}", id);
                    }
                }
                Err(err) => {
                    let err = InsightGenError::Insight {
                        message: err.to_string(),
                    };
                    warn!("{} (submission={})", err, id);
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::CellValue;

    fn state_with_result(rows: Vec<Row>) -> PresentationState {
        PresentationState {
            stage: PipelineStage::Done,
            query_text: Some("SELECT 1".into()),
            result: Some(ResultSet {
                columns: vec!["category".into(), "total".into()],
                rows,
            }),
            insight: None,
            error: None,
        }
    }

    fn sample_row() -> Row {
        vec![
            ("category".to_string(), CellValue::Text("A".into())),
            ("total".to_string(), CellValue::Number(10.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn stage_labels_match_progress_indicator() {
        assert_eq!(
            PipelineStage::GeneratingQuery.to_string(),
            "Generating query..."
        );
        assert_eq!(
            PipelineStage::ExecutingQuery.to_string(),
            "Executing query..."
        );
        assert_eq!(
            PipelineStage::AnalyzingResult.to_string(),
            "Analyzing data..."
        );
    }

    #[test]
    fn only_done_and_failed_are_terminal() {
        assert!(PipelineStage::Done.is_terminal());
        assert!(PipelineStage::Failed.is_terminal());
        assert!(!PipelineStage::Idle.is_terminal());
        assert!(!PipelineStage::AnalyzingResult.is_terminal());
    }

    #[test]
    fn chart_encoding_is_derived_from_current_result() {
        let state = state_with_result(vec![sample_row()]);
        let encoding = state.chart_encoding().unwrap();
        assert_eq!(encoding.x_key.as_deref(), Some("category"));
        assert_eq!(encoding.y_key.as_deref(), Some("total"));

        let empty = PresentationState::default();
        assert!(empty.chart_encoding().is_none());
    }

    #[test]
    fn insight_pending_tracks_result_without_insight() {
        let mut state = state_with_result(vec![sample_row()]);
        assert!(state.insight_pending());

        state.insight = Some("two bullet points".into());
        assert!(!state.insight_pending());

        assert!(!PresentationState::default().insight_pending());
    }

    #[test]
    fn loading_covers_the_three_in_flight_stages() {
        for stage in [
            PipelineStage::GeneratingQuery,
            PipelineStage::ExecutingQuery,
            PipelineStage::AnalyzingResult,
        ] {
            let state = PresentationState {
                stage,
                ..Default::default()
            };
            assert!(state.is_loading());
        }
        assert!(
            !PresentationState {
                stage: PipelineStage::Done,
                ..Default::default()
            }
            .is_loading()
        );
    }

    #[test]
    fn user_error_prefers_detail_over_generic() {
        let with_detail = StageError::Api {
            status: 400,
            detail: Some("Only SELECT queries are allowed.".into()),
        };
        assert_eq!(user_error(&with_detail), "Only SELECT queries are allowed.");

        let transport = StageError::Transport("connection refused".into());
        assert_eq!(user_error(&transport), GENERIC_ERROR);
    }
}
