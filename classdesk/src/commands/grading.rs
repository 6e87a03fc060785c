//! Grading commands
//!
//! Every command names the assessment whose grading session it acts on;
//! the session is opened on first use.

use super::{parse, to_json};
use crate::app::AppState;
use crate::config::MAX_FEEDBACK_LENGTH;
use crate::error::{AppError, Result};
use crate::grading::GradeRow;
use crate::services::GradingService;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct AssessmentParams {
    assessment_id: String,
}

#[derive(Debug, Deserialize)]
struct RowParams {
    assessment_id: String,
    row_id: String,
}

#[derive(Debug, Deserialize)]
struct ScoreParams {
    assessment_id: String,
    row_id: String,
    #[serde(default)]
    score: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FeedbackParams {
    assessment_id: String,
    row_id: String,
    feedback: String,
}

#[derive(Debug, Deserialize)]
struct DateParams {
    assessment_id: String,
    row_id: String,
    #[serde(default)]
    date: Option<DateTime<Utc>>,
}

/// Result of a field edit. Edits to unknown rows are not errors.
#[derive(Debug, Serialize)]
struct EditResult {
    applied: bool,
    row: Option<GradeRow>,
}

async fn edited(session: &GradingService, row_id: &str, applied: bool) -> Result<Value> {
    to_json(EditResult {
        applied,
        row: session.row(row_id).await,
    })
}

pub async fn handle(state: &AppState, method: &str, params: Value) -> Result<Value> {
    match method {
        "grading.open" => {
            let AssessmentParams { assessment_id } = parse(params)?;
            let session = state.open_grading(&assessment_id).await?;
            to_json(session.snapshot().await)
        }
        "grading.rows" => {
            let AssessmentParams { assessment_id } = parse(params)?;
            to_json(state.grading(&assessment_id).await?.snapshot().await)
        }
        "grading.refresh" => {
            let AssessmentParams { assessment_id } = parse(params)?;
            let session = state.grading(&assessment_id).await?;
            // Failures are reported through the snapshot's fetch status
            if let Err(e) = session.refresh().await {
                tracing::warn!("Refresh of assessment {} failed: {}", assessment_id, e);
            }
            to_json(session.snapshot().await)
        }
        "grading.set_score" => {
            let p: ScoreParams = parse(params)?;
            let session = state.grading(&p.assessment_id).await?;
            let applied = session.set_score(&p.row_id, p.score).await;
            edited(&session, &p.row_id, applied).await
        }
        "grading.set_feedback" => {
            let p: FeedbackParams = parse(params)?;
            if p.feedback.chars().count() > MAX_FEEDBACK_LENGTH {
                return Err(AppError::Validation(format!(
                    "feedback is longer than {} characters",
                    MAX_FEEDBACK_LENGTH
                )));
            }
            let session = state.grading(&p.assessment_id).await?;
            let applied = session.set_feedback(&p.row_id, p.feedback).await;
            edited(&session, &p.row_id, applied).await
        }
        "grading.set_submitted_date" => {
            let p: DateParams = parse(params)?;
            let session = state.grading(&p.assessment_id).await?;
            let applied = session.set_submitted_date(&p.row_id, p.date).await;
            edited(&session, &p.row_id, applied).await
        }
        "grading.set_graded_date" => {
            let p: DateParams = parse(params)?;
            let session = state.grading(&p.assessment_id).await?;
            let applied = session.set_graded_date(&p.row_id, p.date).await;
            edited(&session, &p.row_id, applied).await
        }
        "grading.save_row" => {
            let p: RowParams = parse(params)?;
            let session = state.grading(&p.assessment_id).await?;
            let outcome = session.save_row(&p.row_id).await;
            to_json(serde_json::json!({
                "outcome": outcome,
                "row": session.row(&p.row_id).await,
            }))
        }
        "grading.save_all" => {
            let AssessmentParams { assessment_id } = parse(params)?;
            let session = state.grading(&assessment_id).await?;
            to_json(session.save_all().await)
        }
        "grading.close" => {
            let AssessmentParams { assessment_id } = parse(params)?;
            let closed = state.close_grading(&assessment_id).await;
            to_json(serde_json::json!({ "closed": closed }))
        }
        _ => Err(AppError::UnknownMethod(method.to_string())),
    }
}
