use std::sync::Arc;

use chrono::Utc;

use crate::application::ports::{RepositoryError, SessionRepository, TaskDispatcher};
use crate::domain::{Session, Task};

/// Reacts to "no successor stage": closes the session and hands it to
/// finalization.
pub struct CompletionDetector {
    sessions: Arc<dyn SessionRepository>,
    dispatcher: Arc<dyn TaskDispatcher>,
}

impl CompletionDetector {
    pub fn new(sessions: Arc<dyn SessionRepository>, dispatcher: Arc<dyn TaskDispatcher>) -> Self {
        Self {
            sessions,
            dispatcher,
        }
    }

    /// Flips the session to completed. Only the call that performed the flip
    /// dispatches finalization, so repeated completion triggers enqueue it
    /// once. Returns whether this call completed the session.
    #[tracing::instrument(skip_all, fields(session_id = %session.id))]
    pub async fn complete(&self, session: &Session) -> Result<bool, RepositoryError> {
        let flipped = self.sessions.mark_completed(session.id, Utc::now()).await?;
        if !flipped {
            tracing::debug!("Session already completed");
            return Ok(false);
        }

        tracing::info!(catalog = %session.catalog_id, "Interview completed");

        if let Err(e) = self
            .dispatcher
            .dispatch(Task::FinalizeSession {
                session_id: session.id,
            })
            .await
        {
            tracing::error!(error = %e, "Failed to dispatch session finalization");
        }

        Ok(true)
    }
}
