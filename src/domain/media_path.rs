use std::fmt;

use super::{QuestionId, SessionId};

/// Key of an object in the shared media store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaPath(String);

impl MediaPath {
    /// Content-addressed location of the synthesized audio for a question.
    pub fn speech(session_id: SessionId, question_id: QuestionId, format: &str) -> Self {
        Self(format!("speech/{}/{}.{}", session_id, question_id, format))
    }

    pub fn answer_audio(session_id: SessionId, upload_id: uuid::Uuid, extension: &str) -> Self {
        Self(format!("answers/{}/{}.{}", session_id, upload_id, extension))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
