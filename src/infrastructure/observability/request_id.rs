use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::Instrument;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_request(request: &Request) -> Self {
        let id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        Self(id)
    }
}

/// Session id segment of `.../sessions/{id}/...` paths, so request logs line
/// up with the lane worker logs for the same session.
fn session_segment(path: &str) -> Option<&str> {
    let mut segments = path.split('/');
    segments.find(|s| *s == "sessions")?;
    segments.next().filter(|id| !id.is_empty())
}

/// Tags every request with an id (reusing the caller's) and runs the
/// handler inside a span carrying it.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = RequestId::from_request(&request);
    let path = request.uri().path().to_string();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id.0,
        method = %request.method(),
        path = %path,
        session_id = tracing::field::Empty,
    );
    if let Some(session_id) = session_segment(&path) {
        span.record("session_id", session_id);
    }

    let header_value = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).instrument(span).await;
    if let Some(value) = header_value {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
