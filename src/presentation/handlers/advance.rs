use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::error::parse_session_id;
use crate::application::services::AdvanceOutcome;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct AdvanceResponse {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_id: Option<String>,
}

impl From<AdvanceOutcome> for AdvanceResponse {
    fn from(outcome: AdvanceOutcome) -> Self {
        let empty = Self {
            outcome: "",
            reason: None,
            stage: None,
            stage_type: None,
            question_id: None,
            turn_id: None,
        };
        match outcome {
            AdvanceOutcome::Produced {
                stage,
                stage_type,
                question_id,
                turn_id,
                ..
            } => Self {
                outcome: "produced",
                stage: Some(stage),
                stage_type: Some(stage_type.as_str()),
                question_id: Some(question_id.to_string()),
                turn_id: Some(turn_id.to_string()),
                ..empty
            },
            AdvanceOutcome::Completed => Self {
                outcome: "completed",
                ..empty
            },
            AdvanceOutcome::Skipped(reason) => Self {
                outcome: "skipped",
                reason: Some(reason.as_str()),
                ..empty
            },
        }
    }
}

/// Runs one orchestrator step synchronously, for operators and tests.
#[tracing::instrument(skip(state))]
pub async fn advance_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.orchestrator.advance(id).await {
        Ok(outcome) => (StatusCode::OK, Json(AdvanceResponse::from(outcome))).into_response(),
        Err(e) => e.into_response(),
    }
}
