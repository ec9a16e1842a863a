use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::application::ports::{RepositoryError, SessionRepository, TurnRepository};
use crate::domain::{
    NewTurn, ProducedQuestion, QuestionId, SessionId, SessionStatus, Session, Turn, TurnLogEntry,
};

#[derive(Default)]
struct State {
    sessions: HashMap<SessionId, Session>,
    questions: Vec<ProducedQuestion>,
    turns: Vec<Turn>,
    next_insertion_id: i64,
}

impl State {
    fn session_mut(&mut self, id: SessionId) -> Result<&mut Session, RepositoryError> {
        self.sessions
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::NotFound(format!("session {}", id)))
    }

    fn append(&mut self, turn: &NewTurn) -> Result<Turn, RepositoryError> {
        self.session_mut(turn.session_id)?;
        let order = self
            .turns
            .iter()
            .filter(|t| t.session_id == turn.session_id)
            .map(|t| t.order)
            .max()
            .unwrap_or(0)
            + 1;
        self.next_insertion_id += 1;
        let appended = turn.clone().into_turn(order, self.next_insertion_id);
        self.turns.push(appended.clone());
        Ok(appended)
    }

    fn insert_question(&mut self, question: &ProducedQuestion) -> Result<(), RepositoryError> {
        self.session_mut(question.session_id)?;
        if self
            .questions
            .iter()
            .any(|q| q.session_id == question.session_id && q.stage == question.stage)
        {
            return Err(RepositoryError::ConstraintViolation(
                "produced_questions_session_stage_key".to_string(),
            ));
        }
        self.questions.push(question.clone());
        Ok(())
    }

    fn stage_of(&self, question_id: Option<QuestionId>) -> Option<String> {
        let question_id = question_id?;
        self.questions
            .iter()
            .find(|q| q.id == question_id)
            .map(|q| q.stage.clone())
    }
}

/// Process-local store implementing both repositories over one lock, so the
/// question+turn+current-stage write stays atomic like its Postgres twin.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemoryRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.sessions.contains_key(&session.id) {
            return Err(RepositoryError::ConstraintViolation("sessions_pkey".to_string()));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, RepositoryError> {
        Ok(self.state.lock().await.sessions.get(&id).cloned())
    }

    async fn mark_live(&self, id: SessionId, at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let session = state.session_mut(id)?;
        if session.status != SessionStatus::Scheduled {
            return Ok(false);
        }
        session.status = SessionStatus::Live;
        session.started_at = Some(at);
        Ok(true)
    }

    async fn mark_completed(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let session = state.session_mut(id)?;
        if session.status == SessionStatus::Completed {
            return Ok(false);
        }
        session.status = SessionStatus::Completed;
        session.completed_at = Some(at);
        Ok(true)
    }
}

#[async_trait]
impl TurnRepository for InMemoryRepository {
    async fn load_log(&self, session_id: SessionId) -> Result<Vec<TurnLogEntry>, RepositoryError> {
        let state = self.state.lock().await;
        let mut log: Vec<TurnLogEntry> = state
            .turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .map(|t| TurnLogEntry {
                turn: t.clone(),
                stage: state.stage_of(t.question_id),
            })
            .collect();
        log.sort_by_key(|e| (e.turn.order, e.turn.insertion_id));
        Ok(log)
    }

    async fn latest_turn(&self, session_id: SessionId) -> Result<Option<Turn>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .turns
            .iter()
            .filter(|t| t.session_id == session_id)
            .max_by_key(|t| (t.order, t.insertion_id))
            .cloned())
    }

    async fn latest_ai_turn(
        &self,
        session_id: SessionId,
    ) -> Result<Option<Turn>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .turns
            .iter()
            .filter(|t| t.session_id == session_id && t.is_ai())
            .max_by_key(|t| (t.order, t.insertion_id))
            .cloned())
    }

    async fn append_turn(&self, turn: &NewTurn) -> Result<Turn, RepositoryError> {
        self.state.lock().await.append(turn)
    }

    async fn append_question_turn(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError> {
        let mut state = self.state.lock().await;
        state.insert_question(question)?;
        let appended = state.append(turn)?;
        state.session_mut(question.session_id)?.current_stage = Some(question.stage.clone());
        Ok(appended)
    }

    async fn append_turn_for_question(
        &self,
        question: &ProducedQuestion,
        turn: &NewTurn,
    ) -> Result<Turn, RepositoryError> {
        let mut state = self.state.lock().await;
        let appended = state.append(turn)?;
        state.session_mut(question.session_id)?.current_stage = Some(question.stage.clone());
        Ok(appended)
    }

    async fn insert_question(&self, question: &ProducedQuestion) -> Result<(), RepositoryError> {
        self.state.lock().await.insert_question(question)
    }

    async fn find_question(
        &self,
        session_id: SessionId,
        stage: &str,
    ) -> Result<Option<ProducedQuestion>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .questions
            .iter()
            .find(|q| q.session_id == session_id && q.stage == stage)
            .cloned())
    }

    async fn get_question(
        &self,
        id: QuestionId,
    ) -> Result<Option<ProducedQuestion>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn stage_has_turn(
        &self,
        session_id: SessionId,
        stage: &str,
    ) -> Result<bool, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.turns.iter().any(|t| {
            t.session_id == session_id
                && t.is_ai()
                && state.stage_of(t.question_id).as_deref() == Some(stage)
        }))
    }

    async fn list_questions(
        &self,
        session_id: SessionId,
    ) -> Result<Vec<ProducedQuestion>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .questions
            .iter()
            .filter(|q| q.session_id == session_id)
            .cloned()
            .collect())
    }
}
