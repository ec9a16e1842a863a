use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::{NewTurn, ProducedQuestion, QuestionId, SessionId, Turn, TurnLogEntry};

/// Append-only turn log plus the questions its AI turns reference.
#[async_trait]
pub trait TurnRepository: Send + Sync {
    /// Whole log for a session, ascending by `order` then `insertion_id`,
    /// each turn joined with its question's stage name.
    async fn load_log(&self, session_id: SessionId) -> Result<Vec<TurnLogEntry>, RepositoryError>;

    async fn latest_turn(&self, session_id: SessionId) -> Result<Option<Turn>, RepositoryError>;

    /// Most recent AI turn, however many candidate turns followed it.
    async fn latest_ai_turn(&self, session_id: SessionId)
    -> Result<Option<Turn>, RepositoryError>;

    /// Appends a turn at the next `order` for its session.
    async fn append_turn(&self, turn: &NewTurn) -> Result<Turn, RepositoryError>;

    /// Persists a new question, its AI turn and the session's materialized
    /// current stage in one atomic write. A second question for the same
    /// (session, stage) fails with `ConstraintViolation`.
    async fn append_question_turn(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError>;

    /// Appends the AI turn for a question that was produced earlier and
    /// moves the session's current stage, atomically.
    async fn append_turn_for_question(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError>;

    /// Persists a question without asking it yet.
    async fn insert_question(&self, question: &ProducedQuestion) -> Result<(), RepositoryError>;

    async fn find_question(
        &self,
        session_id: SessionId,
        stage: &str,
    ) -> Result<Option<ProducedQuestion>, RepositoryError>;

    async fn get_question(&self, id: QuestionId)
    -> Result<Option<ProducedQuestion>, RepositoryError>;

    async fn stage_has_turn(&self, session_id: SessionId, stage: &str)
    -> Result<bool, RepositoryError>;

    async fn list_questions(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ProducedQuestion>, RepositoryError>;
}
