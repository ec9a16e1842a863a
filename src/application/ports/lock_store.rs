use std::time::Duration;

use async_trait::async_trait;

/// Short-lived named locks shared by all workers.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Sets `key` for `owner` if it is absent or expired. Returns whether
    /// `owner` now holds it.
    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, LockStoreError>;

    /// Deletes `key` only while `owner` still holds it. Returns whether
    /// anything was deleted.
    async fn release_owned(&self, key: &str, owner: &str) -> Result<bool, LockStoreError>;

    async fn release(&self, key: &str) -> Result<(), LockStoreError>;

    /// Anonymous variant of [`LockStore::try_acquire`] for dedup markers.
    async fn try_set_if_absent(&self, key: &str, ttl: Duration) -> Result<bool, LockStoreError> {
        self.try_acquire(key, "", ttl).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockStoreError {
    #[error("lock store unavailable: {0}")]
    Unavailable(String),
}
