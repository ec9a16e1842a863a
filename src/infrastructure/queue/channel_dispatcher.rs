use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::application::ports::{DispatchError, TaskDispatcher};
use crate::application::services::task_routes;
use crate::domain::{Lane, Task, TaskEnvelope};

/// Consumer ends of the lane queues, handed to the lane workers.
pub struct LaneReceivers {
    pub light: mpsc::Receiver<TaskEnvelope>,
    pub heavy: mpsc::Receiver<TaskEnvelope>,
}

/// In-process dispatcher with one bounded queue per lane. Submission never
/// waits: a full lane rejects the task.
#[derive(Clone)]
pub struct ChannelDispatcher {
    light: mpsc::Sender<TaskEnvelope>,
    heavy: mpsc::Sender<TaskEnvelope>,
}

impl ChannelDispatcher {
    pub fn new(capacity: usize) -> (Self, LaneReceivers) {
        let (light_tx, light_rx) = mpsc::channel(capacity.max(1));
        let (heavy_tx, heavy_rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                light: light_tx,
                heavy: heavy_tx,
            },
            LaneReceivers {
                light: light_rx,
                heavy: heavy_rx,
            },
        )
    }

    fn sender(&self, lane: Lane) -> &mpsc::Sender<TaskEnvelope> {
        match lane {
            Lane::Light => &self.light,
            Lane::Heavy => &self.heavy,
        }
    }
}

#[async_trait]
impl TaskDispatcher for ChannelDispatcher {
    async fn dispatch(&self, task: Task) -> Result<Lane, DispatchError> {
        let lane = task_routes::lane_for(task.kind());
        let envelope = TaskEnvelope::new(lane, task);
        let task_id = envelope.id;
        let kind = envelope.task.kind();

        self.sender(lane).try_send(envelope).map_err(|e| match e {
            TrySendError::Full(_) => DispatchError::LaneFull(lane),
            TrySendError::Closed(_) => DispatchError::LaneClosed(lane),
        })?;

        tracing::debug!(task = %kind, task_id = %task_id, lane = %lane, "Task dispatched");
        Ok(lane)
    }
}
