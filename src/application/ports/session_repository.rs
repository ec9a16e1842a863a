use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::RepositoryError;
use crate::domain::{Session, SessionId};

#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError>;

    async fn get_by_id(&self, id: SessionId) -> Result<Option<Session>, RepositoryError>;

    /// Flips `scheduled` to `live`. Returns `false` when the session was
    /// not in `scheduled`.
    async fn mark_live(&self, id: SessionId, at: DateTime<Utc>) -> Result<bool, RepositoryError>;

    /// Flips any non-completed status to `completed` and stamps the end
    /// time. Returns `true` only for the call that performed the flip.
    async fn mark_completed(
        &self,
        id: SessionId,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError>;
}
