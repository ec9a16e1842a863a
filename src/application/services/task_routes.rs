use crate::domain::{Lane, TaskKind};

/// Static lane assignment keyed by task name. Cheap, latency-sensitive work
/// stays off the lane that waits on model inference.
pub const ROUTES: &[(&str, Lane)] = &[
    ("advance_interview", Lane::Heavy),
    ("generate_question", Lane::Heavy),
    ("embed_resume", Lane::Heavy),
    ("finalize_session", Lane::Heavy),
    ("synthesize_speech", Lane::Light),
    ("transcribe_answer", Lane::Light),
    ("render_template", Lane::Light),
    ("score_media", Lane::Light),
];

pub fn route(task_name: &str) -> Option<Lane> {
    ROUTES
        .iter()
        .find(|(name, _)| *name == task_name)
        .map(|(_, lane)| *lane)
}

/// Lane for a task kind. Kinds missing from the table go to the heavy lane.
pub fn lane_for(kind: TaskKind) -> Lane {
    route(kind.name()).unwrap_or_else(|| {
        tracing::warn!(task = %kind, "Task kind has no route, sending to heavy lane");
        Lane::Heavy
    })
}
