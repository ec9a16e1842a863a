use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    DispatchError, LockStore, LockStoreError, MediaStore, MediaStoreError, RepositoryError,
    SpeechError, SpeechSynthesizer, TaskDispatcher, TurnRepository,
};
use crate::domain::{MediaPath, QuestionId, SessionId, Task};

/// Result of asking for a question to be voiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechRequest {
    Enqueued,
    AlreadyRendered,
    InFlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechRender {
    Rendered { bytes: usize },
    AlreadyRendered,
}

/// Turns produced questions into audio at a path keyed by question id.
/// Concurrent requests for one question collapse into a single render.
pub struct SynthesisService {
    turns: Arc<dyn TurnRepository>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    media_store: Arc<dyn MediaStore>,
    lock_store: Arc<dyn LockStore>,
    dispatcher: Arc<dyn TaskDispatcher>,
    lock_ttl: Duration,
}

impl SynthesisService {
    pub fn new(
        turns: Arc<dyn TurnRepository>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        media_store: Arc<dyn MediaStore>,
        lock_store: Arc<dyn LockStore>,
        dispatcher: Arc<dyn TaskDispatcher>,
        lock_ttl: Duration,
    ) -> Self {
        Self {
            turns,
            synthesizer,
            media_store,
            lock_store,
            dispatcher,
            lock_ttl,
        }
    }

    pub fn output_path(&self, session_id: SessionId, question_id: QuestionId) -> MediaPath {
        MediaPath::speech(session_id, question_id, self.synthesizer.format())
    }

    fn lock_key(question_id: QuestionId) -> String {
        format!("tts:{}", question_id)
    }

    /// Enqueues synthesis on the light lane unless the audio already exists
    /// or another request holds the question's lock.
    #[tracing::instrument(skip(self), fields(session_id = %session_id, question_id = %question_id))]
    pub async fn request(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
    ) -> Result<SpeechRequest, SynthesisError> {
        let path = self.output_path(session_id, question_id);
        if self.media_store.exists(&path).await? {
            tracing::debug!(path = %path, "Speech already rendered");
            return Ok(SpeechRequest::AlreadyRendered);
        }

        let key = Self::lock_key(question_id);
        if !self.lock_store.try_set_if_absent(&key, self.lock_ttl).await? {
            tracing::debug!(lock = %key, "Speech synthesis already in flight");
            return Ok(SpeechRequest::InFlight);
        }

        if let Err(e) = self
            .dispatcher
            .dispatch(Task::SynthesizeSpeech {
                session_id,
                question_id,
            })
            .await
        {
            self.release(&key).await;
            return Err(e.into());
        }

        Ok(SpeechRequest::Enqueued)
    }

    /// Lane-side consumer: renders and stores the audio, then drops the lock.
    #[tracing::instrument(skip(self), fields(session_id = %session_id, question_id = %question_id))]
    pub async fn render(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
    ) -> Result<SpeechRender, SynthesisError> {
        let key = Self::lock_key(question_id);
        let result = self.render_inner(session_id, question_id).await;
        self.release(&key).await;
        result
    }

    async fn render_inner(
        &self,
        session_id: SessionId,
        question_id: QuestionId,
    ) -> Result<SpeechRender, SynthesisError> {
        let path = self.output_path(session_id, question_id);
        if self.media_store.exists(&path).await? {
            return Ok(SpeechRender::AlreadyRendered);
        }

        let question = self
            .turns
            .get_question(question_id)
            .await?
            .ok_or(SynthesisError::QuestionNotFound(question_id))?;

        let audio = self.synthesizer.synthesize(&question.content).await?;
        let bytes = audio.len();
        self.media_store.put(&path, audio).await?;

        tracing::info!(path = %path, bytes, "Speech rendered");
        Ok(SpeechRender::Rendered { bytes })
    }

    async fn release(&self, key: &str) {
        if let Err(e) = self.lock_store.release(key).await {
            tracing::warn!(error = %e, lock = %key, "Failed to release speech lock");
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("question not found: {0}")]
    QuestionNotFound(QuestionId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("speech: {0}")]
    Speech(#[from] SpeechError),
    #[error("media store: {0}")]
    MediaStore(#[from] MediaStoreError),
    #[error("lock store: {0}")]
    LockStore(#[from] LockStoreError),
    #[error("dispatch: {0}")]
    Dispatch(#[from] DispatchError),
}
