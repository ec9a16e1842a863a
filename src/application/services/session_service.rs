use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

use super::scenario_selector;
use super::{StageProducer, StateDeriver, SynthesisService};
use crate::application::ports::{
    DispatchError, MediaStore, MediaStoreError, RepositoryError, SessionRepository,
    TaskDispatcher, TranscriptionEngine, TranscriptionError, TurnRepository,
};
use crate::domain::{
    CatalogRegistry, MediaPath, NewSession, NewTurn, Session, SessionId, SessionStatus,
    StageType, Task, Turn, TurnLogEntry,
};

/// Read model for the session status API.
#[derive(Debug, Clone)]
pub struct SessionOverview {
    pub session: Session,
    pub last_answered_stage: Option<String>,
    pub turn_count: usize,
}

/// Everything around the orchestrator that a session needs: creation with
/// catalog binding, the eager opening, and candidate answer ingestion.
pub struct SessionService {
    catalogs: CatalogRegistry,
    sessions: Arc<dyn SessionRepository>,
    turns: Arc<dyn TurnRepository>,
    producer: Arc<StageProducer>,
    synthesis: Arc<SynthesisService>,
    dispatcher: Arc<dyn TaskDispatcher>,
    media_store: Arc<dyn MediaStore>,
    transcription_engine: Arc<dyn TranscriptionEngine>,
    deriver: StateDeriver,
}

impl SessionService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalogs: CatalogRegistry,
        sessions: Arc<dyn SessionRepository>,
        turns: Arc<dyn TurnRepository>,
        producer: Arc<StageProducer>,
        synthesis: Arc<SynthesisService>,
        dispatcher: Arc<dyn TaskDispatcher>,
        media_store: Arc<dyn MediaStore>,
        transcription_engine: Arc<dyn TranscriptionEngine>,
    ) -> Self {
        Self {
            catalogs,
            deriver: StateDeriver::new(Arc::clone(&turns)),
            sessions,
            turns,
            producer,
            synthesis,
            dispatcher,
            media_store,
            transcription_engine,
        }
    }

    #[tracing::instrument(skip_all, fields(target_role = %attrs.target_role))]
    pub async fn create_session(&self, attrs: NewSession) -> Result<Session, SessionServiceError> {
        let catalog_id = scenario_selector::select(&attrs.prior_field, &attrs.target_role);
        let session = Session::new(attrs, catalog_id);
        self.sessions.create(&session).await?;

        tracing::info!(
            session_id = %session.id,
            catalog = %catalog_id,
            role_family = scenario_selector::role_family(&session.target_role).unwrap_or("none"),
            "Session created"
        );
        Ok(session)
    }

    pub async fn get_session(&self, id: SessionId) -> Result<Session, SessionServiceError> {
        self.sessions
            .get_by_id(id)
            .await?
            .ok_or(SessionServiceError::SessionNotFound(id))
    }

    pub async fn overview(&self, id: SessionId) -> Result<SessionOverview, SessionServiceError> {
        let session = self.get_session(id).await?;
        let catalog = self.catalogs.get(session.catalog_id);
        let last_answered_stage = self.deriver.last_answered_stage(id, &catalog).await?;
        let turn_count = self.turns.load_log(id).await?.len();
        Ok(SessionOverview {
            session,
            last_answered_stage,
            turn_count,
        })
    }

    /// Opens a scheduled session: produces the first two stages up front,
    /// asks the first and queues speech for both.
    #[tracing::instrument(skip(self), fields(session_id = %id))]
    pub async fn start_session(&self, id: SessionId) -> Result<Turn, SessionServiceError> {
        let session = self.get_session(id).await?;
        if !self.sessions.mark_live(id, Utc::now()).await? {
            return Err(SessionServiceError::InvalidState {
                session_id: id,
                status: session.status,
            });
        }

        let catalog = self.catalogs.get(session.catalog_id);
        let first = catalog.first();
        let opening = self.producer.produce(&session, &catalog, first, None).await;
        let turn = NewTurn::ai(id, opening.id, opening.content.clone());
        let turn = self.turns.append_question_turn(&opening, &turn).await?;
        let mut to_voice = vec![opening.id];

        if let Some(second) = catalog
            .second()
            .filter(|s| s.stage_type != StageType::FollowUp)
        {
            let eager = self.producer.produce(&session, &catalog, second, None).await;
            match self.turns.insert_question(&eager).await {
                Ok(()) => to_voice.push(eager.id),
                Err(e) if e.is_constraint_violation() => {
                    tracing::debug!(stage = %second.name, "Second stage already produced");
                }
                Err(e) => return Err(e.into()),
            }
        }

        for question_id in to_voice {
            if let Err(e) = self.synthesis.request(id, question_id).await {
                tracing::warn!(error = %e, question_id = %question_id, "Failed to request speech");
            }
        }

        tracing::info!(stage = %first.name, "Session opened");
        Ok(turn)
    }

    /// Appends the candidate's answer to the question last asked and
    /// schedules the next advance. Blank answers are recorded as given.
    #[tracing::instrument(skip(self, text), fields(session_id = %id, chars = text.len()))]
    pub async fn record_answer(&self, id: SessionId, text: &str) -> Result<Turn, SessionServiceError> {
        let session = self.get_session(id).await?;
        if session.status != SessionStatus::Live {
            return Err(SessionServiceError::InvalidState {
                session_id: id,
                status: session.status,
            });
        }

        // A repeated answer links to the same question as the first one.
        let answered = self
            .turns
            .latest_ai_turn(id)
            .await?
            .and_then(|t| t.question_id);
        if answered.is_none() {
            tracing::warn!("Answer arrived before any AI question");
        }

        let turn = self
            .turns
            .append_turn(&NewTurn::candidate(id, answered, text.trim().to_string()))
            .await?;

        self.dispatcher
            .dispatch(Task::AdvanceInterview { session_id: id })
            .await?;

        Ok(turn)
    }

    /// Stores raw answer audio and queues its transcription.
    #[tracing::instrument(skip(self, audio), fields(session_id = %id, bytes = audio.len()))]
    pub async fn submit_audio_answer(
        &self,
        id: SessionId,
        audio: Bytes,
        extension: &str,
    ) -> Result<MediaPath, SessionServiceError> {
        let session = self.get_session(id).await?;
        if session.status != SessionStatus::Live {
            return Err(SessionServiceError::InvalidState {
                session_id: id,
                status: session.status,
            });
        }
        if audio.is_empty() {
            return Err(SessionServiceError::EmptyAudio);
        }

        let path = MediaPath::answer_audio(id, Uuid::new_v4(), extension);
        self.media_store.put(&path, audio).await?;
        self.dispatcher
            .dispatch(Task::TranscribeAnswer {
                session_id: id,
                audio_path: path.clone(),
            })
            .await?;

        Ok(path)
    }

    /// Light-lane consumer of `transcribe_answer`.
    #[tracing::instrument(skip(self), fields(session_id = %id, path = %path))]
    pub async fn transcribe_answer(
        &self,
        id: SessionId,
        path: &MediaPath,
    ) -> Result<Turn, SessionServiceError> {
        let audio = self.media_store.fetch(path).await?;
        let text = self.transcription_engine.transcribe(&audio).await?;
        tracing::debug!(chars = text.len(), "Answer transcribed");
        self.record_answer(id, &text).await
    }

    pub async fn transcript(&self, id: SessionId) -> Result<Vec<TurnLogEntry>, SessionServiceError> {
        self.get_session(id).await?;
        Ok(self.turns.load_log(id).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("session {session_id} is {status}")]
    InvalidState {
        session_id: SessionId,
        status: SessionStatus,
    },
    #[error("empty audio upload")]
    EmptyAudio,
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("media store: {0}")]
    MediaStore(#[from] MediaStoreError),
    #[error("transcription: {0}")]
    Transcription(#[from] TranscriptionError),
}
