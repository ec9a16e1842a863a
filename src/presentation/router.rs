use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::infrastructure::observability::request_id_middleware;
use crate::presentation::handlers::{
    advance_handler, create_session_handler, get_session_handler, health_handler,
    start_session_handler, submit_answer_handler, submit_audio_answer_handler,
    transcript_handler,
};
use crate::presentation::state::AppState;

const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/v1/sessions", post(create_session_handler))
        .route("/api/v1/sessions/{session_id}", get(get_session_handler))
        .route(
            "/api/v1/sessions/{session_id}/start",
            post(start_session_handler),
        )
        .route(
            "/api/v1/sessions/{session_id}/answers",
            post(submit_answer_handler),
        )
        .route(
            "/api/v1/sessions/{session_id}/answers/audio",
            post(submit_audio_answer_handler).layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route(
            "/api/v1/sessions/{session_id}/advance",
            post(advance_handler),
        )
        .route(
            "/api/v1/sessions/{session_id}/turns",
            get(transcript_handler),
        )
        .layer(middleware::from_fn(request_id_middleware))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
