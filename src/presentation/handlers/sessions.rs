use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{error_response, parse_session_id};
use crate::application::services::SessionOverview;
use crate::domain::{CandidateId, NewSession, Session};
use crate::presentation::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub candidate_id: Option<Uuid>,
    pub candidate_name: String,
    #[serde(default)]
    pub prior_field: String,
    #[serde(default)]
    pub target_role: String,
    pub organization: Option<String>,
    pub resume_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct SessionResponse {
    pub id: String,
    pub candidate_name: String,
    pub target_role: String,
    pub catalog: String,
    pub status: String,
    pub current_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_answered_stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn_count: Option<usize>,
    pub created_at: String,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.to_string(),
            candidate_name: session.candidate_name.clone(),
            target_role: session.target_role.clone(),
            catalog: session.catalog_id.as_str().to_string(),
            status: session.status.as_str().to_string(),
            current_stage: session.current_stage.clone(),
            last_answered_stage: None,
            turn_count: None,
            created_at: session.created_at.to_rfc3339(),
            started_at: session.started_at.map(|t| t.to_rfc3339()),
            completed_at: session.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<SessionOverview> for SessionResponse {
    fn from(overview: SessionOverview) -> Self {
        Self {
            last_answered_stage: overview.last_answered_stage,
            turn_count: Some(overview.turn_count),
            ..SessionResponse::from(&overview.session)
        }
    }
}

#[derive(Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub turn_id: String,
    pub question: String,
}

#[tracing::instrument(skip(state, request), fields(target_role = %request.target_role))]
pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Response {
    if request.candidate_name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "candidate_name must not be empty");
    }

    let attrs = NewSession {
        candidate_id: request
            .candidate_id
            .map(CandidateId::from_uuid)
            .unwrap_or_default(),
        candidate_name: request.candidate_name.trim().to_string(),
        prior_field: request.prior_field,
        target_role: request.target_role,
        organization: request.organization,
        resume_id: request.resume_id,
    };

    match state.session_service.create_session(attrs).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(&session))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.session_service.overview(id).await {
        Ok(overview) => (StatusCode::OK, Json(SessionResponse::from(overview))).into_response(),
        Err(e) => e.into_response(),
    }
}

#[tracing::instrument(skip(state))]
pub async fn start_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let id = match parse_session_id(&session_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match state.session_service.start_session(id).await {
        Ok(turn) => (
            StatusCode::OK,
            Json(StartSessionResponse {
                session_id: id.to_string(),
                turn_id: turn.id.to_string(),
                question: turn.text,
            }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
