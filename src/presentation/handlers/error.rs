use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use uuid::Uuid;

use crate::application::services::{OrchestratorError, SessionServiceError};
use crate::domain::SessionId;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

pub fn parse_session_id(raw: &str) -> Result<SessionId, Response> {
    Uuid::parse_str(raw).map(SessionId::from_uuid).map_err(|_| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid session ID: {}", raw),
        )
    })
}

impl IntoResponse for SessionServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            SessionServiceError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            SessionServiceError::InvalidState { .. } => StatusCode::CONFLICT,
            SessionServiceError::EmptyAudio => StatusCode::BAD_REQUEST,
            SessionServiceError::Dispatch(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Session request failed");
        }
        error_response(status, self.to_string())
    }
}

impl IntoResponse for OrchestratorError {
    fn into_response(self) -> Response {
        let status = match &self {
            OrchestratorError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Advance request failed");
        }
        error_response(status, self.to_string())
    }
}
