use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use super::error::parse_session_id;
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize)]
pub struct AnswerResponse {
    pub turn_id: String,
    pub order: i64,
    pub question_id: Option<String>,
}

#[derive(Serialize)]
pub struct AudioAnswerResponse {
    pub audio_path: String,
    pub status: &'static str,
}

#[tracing::instrument(skip(state, request))]
pub async fn submit_answer_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.session_service.record_answer(id, &request.text).await {
        Ok(turn) => (
            StatusCode::ACCEPTED,
            Json(AnswerResponse {
                turn_id: turn.id.to_string(),
                order: turn.order,
                question_id: turn.question_id.map(|q| q.to_string()),
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

fn audio_extension(headers: &HeaderMap) -> &'static str {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match content_type {
        "audio/mpeg" | "audio/mp3" => "mp3",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        "audio/mp4" | "audio/m4a" => "m4a",
        _ => "wav",
    }
}

#[tracing::instrument(skip(state, headers, body), fields(bytes = body.len()))]
pub async fn submit_audio_answer_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state
        .session_service
        .submit_audio_answer(id, body, audio_extension(&headers))
        .await
    {
        Ok(path) => (
            StatusCode::ACCEPTED,
            Json(AudioAnswerResponse {
                audio_path: path.to_string(),
                status: "transcribing",
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
