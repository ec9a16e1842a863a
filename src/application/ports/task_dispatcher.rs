use async_trait::async_trait;

use crate::domain::{Lane, Task};

/// Fire-and-forget submission of work onto the lane its kind is routed to.
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    async fn dispatch(&self, task: Task) -> Result<Lane, DispatchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("lane {0} is closed")]
    LaneClosed(Lane),
    #[error("lane {0} is full")]
    LaneFull(Lane),
}
