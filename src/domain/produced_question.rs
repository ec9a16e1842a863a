use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{QuestionId, SessionId};

/// Generated artifact for one stage occurrence. At most one exists per
/// (session, stage name).
#[derive(Debug, Clone, PartialEq)]
pub struct ProducedQuestion {
    pub id: QuestionId,
    pub session_id: SessionId,
    pub stage: String,
    pub content: String,
    pub evaluation_category: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl ProducedQuestion {
    pub fn new(
        session_id: SessionId,
        stage: String,
        content: String,
        evaluation_category: Option<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: QuestionId::new(),
            session_id,
            stage,
            content,
            evaluation_category,
            metadata,
            created_at: Utc::now(),
        }
    }
}
