use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::instrument;

use crate::application::ports::{LockStore, LockStoreError};

/// Named locks as rows of `named_locks`. An expired row is taken over by the
/// next setter.
pub struct PgLockStore {
    pool: PgPool,
}

impl PgLockStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LockStore for PgLockStore {
    #[instrument(skip(self), fields(ttl_ms = ttl.as_millis() as u64))]
    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, LockStoreError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;

        let result = sqlx::query(
            r#"
            INSERT INTO named_locks (key, owner, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
                SET owner = EXCLUDED.owner, expires_at = EXCLUDED.expires_at
            WHERE named_locks.expires_at < $4
            "#,
        )
        .bind(key)
        .bind(owner)
        .bind(now + ttl)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn release_owned(&self, key: &str, owner: &str) -> Result<bool, LockStoreError> {
        let result = sqlx::query("DELETE FROM named_locks WHERE key = $1 AND owner = $2")
            .bind(key)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self))]
    async fn release(&self, key: &str) -> Result<(), LockStoreError> {
        sqlx::query("DELETE FROM named_locks WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| LockStoreError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
