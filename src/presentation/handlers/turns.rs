use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::error::parse_session_id;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct TurnResponse {
    pub id: String,
    pub order: i64,
    pub speaker: &'static str,
    pub text: String,
    pub stage: Option<String>,
    pub question_id: Option<String>,
    pub created_at: String,
}

#[tracing::instrument(skip(state))]
pub async fn transcript_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.session_service.transcript(id).await {
        Ok(log) => {
            let turns: Vec<TurnResponse> = log
                .into_iter()
                .map(|entry| TurnResponse {
                    id: entry.turn.id.to_string(),
                    order: entry.turn.order,
                    speaker: entry.turn.speaker.as_str(),
                    text: entry.turn.text,
                    stage: entry.stage,
                    question_id: entry.turn.question_id.map(|q| q.to_string()),
                    created_at: entry.turn.created_at.to_rfc3339(),
                })
                .collect();
            (StatusCode::OK, Json(turns)).into_response()
        }
        Err(e) => e.into_response(),
    }
}
