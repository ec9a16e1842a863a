use std::sync::Arc;

use async_trait::async_trait;

use super::{
    FinalizeError, Finalizer, Orchestrator, OrchestratorError, SessionService,
    SessionServiceError, SynthesisError, SynthesisService,
};
use crate::domain::{Task, TaskKind};

/// Executes one dequeued task. Lane workers only know this seam.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn handle(&self, task: Task) -> Result<(), TaskError>;
}

/// Sends each task kind to the service that consumes it.
pub struct TaskRouter {
    orchestrator: Arc<Orchestrator>,
    synthesis: Arc<SynthesisService>,
    finalizer: Arc<Finalizer>,
    sessions: Arc<SessionService>,
}

impl TaskRouter {
    pub fn new(
        orchestrator: Arc<Orchestrator>,
        synthesis: Arc<SynthesisService>,
        finalizer: Arc<Finalizer>,
        sessions: Arc<SessionService>,
    ) -> Self {
        Self {
            orchestrator,
            synthesis,
            finalizer,
            sessions,
        }
    }
}

#[async_trait]
impl TaskHandler for TaskRouter {
    async fn handle(&self, task: Task) -> Result<(), TaskError> {
        match task {
            Task::AdvanceInterview { session_id } => {
                let outcome = self.orchestrator.advance(session_id).await?;
                tracing::debug!(?outcome, "Advance finished");
            }
            Task::SynthesizeSpeech {
                session_id,
                question_id,
            } => {
                let render = self.synthesis.render(session_id, question_id).await?;
                tracing::debug!(?render, "Synthesis finished");
            }
            Task::TranscribeAnswer {
                session_id,
                audio_path,
            } => {
                self.sessions
                    .transcribe_answer(session_id, &audio_path)
                    .await?;
            }
            Task::FinalizeSession { session_id } => {
                let outcome = self.finalizer.finalize(session_id).await?;
                tracing::debug!(?outcome, "Finalization finished");
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("advance: {0}")]
    Advance(#[from] OrchestratorError),
    #[error("synthesis: {0}")]
    Synthesis(#[from] SynthesisError),
    #[error("finalize: {0}")]
    Finalize(#[from] FinalizeError),
    #[error("session: {0}")]
    Session(#[from] SessionServiceError),
    #[error("{kind} exceeded its time limit")]
    TimedOut { kind: TaskKind },
}
