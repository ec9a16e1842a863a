use chrono::{DateTime, Utc};

use super::{QuestionId, SessionId, Speaker, TurnId};

/// A persisted entry of a session's turn log. Never mutated once written.
///
/// `order` is assigned by the log on append and is strictly increasing per
/// session; `insertion_id` is a storage-wide counter used only to break ties.
/// AI turns reference the question they ask, candidate turns the question
/// they answer.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub id: TurnId,
    pub session_id: SessionId,
    pub speaker: Speaker,
    pub text: String,
    pub question_id: Option<QuestionId>,
    pub order: i64,
    pub insertion_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn is_ai(&self) -> bool {
        self.speaker == Speaker::Ai
    }

    pub fn is_candidate(&self) -> bool {
        self.speaker == Speaker::Candidate
    }
}

/// A turn that has not been appended yet.
#[derive(Debug, Clone)]
pub struct NewTurn {
    pub id: TurnId,
    pub session_id: SessionId,
    pub speaker: Speaker,
    pub text: String,
    pub question_id: Option<QuestionId>,
    pub created_at: DateTime<Utc>,
}

impl NewTurn {
    pub fn ai(session_id: SessionId, question_id: QuestionId, text: String) -> Self {
        Self::build(session_id, Speaker::Ai, text, Some(question_id))
    }

    pub fn candidate(session_id: SessionId, answered: Option<QuestionId>, text: String) -> Self {
        Self::build(session_id, Speaker::Candidate, text, answered)
    }

    fn build(
        session_id: SessionId,
        speaker: Speaker,
        text: String,
        question_id: Option<QuestionId>,
    ) -> Self {
        Self {
            id: TurnId::new(),
            session_id,
            speaker,
            text,
            question_id,
            created_at: Utc::now(),
        }
    }

    pub fn into_turn(self, order: i64, insertion_id: i64) -> Turn {
        Turn {
            id: self.id,
            session_id: self.session_id,
            speaker: self.speaker,
            text: self.text,
            question_id: self.question_id,
            order,
            insertion_id,
            created_at: self.created_at,
        }
    }
}

/// A turn together with the stage name of its linked question, as read
/// back from the log. `stage` is `None` when the link is missing.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnLogEntry {
    pub turn: Turn,
    pub stage: Option<String>,
}
