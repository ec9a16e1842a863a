use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::application::ports::{LockStore, LockStoreError};

struct Held {
    owner: String,
    expires: Instant,
}

#[derive(Default)]
pub struct InMemoryLockStore {
    locks: Mutex<HashMap<String, Held>>,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_held(&self, key: &str) -> bool {
        self.locks
            .lock()
            .await
            .get(key)
            .is_some_and(|held| held.expires > Instant::now())
    }
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn try_acquire(
        &self,
        key: &str,
        owner: &str,
        ttl: Duration,
    ) -> Result<bool, LockStoreError> {
        let mut locks = self.locks.lock().await;
        let now = Instant::now();
        if locks.get(key).is_some_and(|held| held.expires > now) {
            return Ok(false);
        }
        locks.insert(
            key.to_string(),
            Held {
                owner: owner.to_string(),
                expires: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release_owned(&self, key: &str, owner: &str) -> Result<bool, LockStoreError> {
        let mut locks = self.locks.lock().await;
        if locks.get(key).is_some_and(|held| held.owner == owner) {
            locks.remove(key);
            return Ok(true);
        }
        Ok(false)
    }

    async fn release(&self, key: &str) -> Result<(), LockStoreError> {
        self.locks.lock().await.remove(key);
        Ok(())
    }
}
