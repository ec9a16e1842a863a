use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tracing::Instrument;

use super::{TaskError, TaskHandler};
use crate::domain::{Lane, TaskEnvelope};

/// Drains one lane's queue. At most `concurrency` tasks run at once and each
/// is abandoned once it exceeds `time_limit`.
pub struct LaneWorker {
    lane: Lane,
    receiver: mpsc::Receiver<TaskEnvelope>,
    handler: Arc<dyn TaskHandler>,
    permits: Arc<Semaphore>,
    time_limit: Duration,
}

impl LaneWorker {
    pub fn new(
        lane: Lane,
        receiver: mpsc::Receiver<TaskEnvelope>,
        handler: Arc<dyn TaskHandler>,
        concurrency: usize,
        time_limit: Duration,
    ) -> Self {
        Self {
            lane,
            receiver,
            handler,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            time_limit,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(lane = %self.lane, "Lane worker started");
        while let Some(envelope) = self.receiver.recv().await {
            let Ok(permit) = Arc::clone(&self.permits).acquire_owned().await else {
                break;
            };

            let span = tracing::info_span!(
                "lane_task",
                lane = %self.lane,
                task = %envelope.task.kind(),
                task_id = %envelope.id,
                session_id = %envelope.task.session_id(),
            );
            let handler = Arc::clone(&self.handler);
            let time_limit = self.time_limit;

            tokio::spawn(
                async move {
                    let waited = chrono::Utc::now().signed_duration_since(envelope.enqueued_at);
                    tracing::debug!(queued_ms = waited.num_milliseconds(), "Task dequeued");

                    if let Err(e) = execute(handler.as_ref(), envelope, time_limit).await {
                        tracing::error!(error = %e, "Task failed");
                    }
                    drop(permit);
                }
                .instrument(span),
            );
        }
        tracing::info!(lane = %self.lane, "Lane worker stopped: channel closed");
    }
}

async fn execute(
    handler: &dyn TaskHandler,
    envelope: TaskEnvelope,
    time_limit: Duration,
) -> Result<(), TaskError> {
    let kind = envelope.task.kind();
    match tokio::time::timeout(time_limit, handler.handle(envelope.task)).await {
        Ok(result) => result,
        Err(_) => Err(TaskError::TimedOut { kind }),
    }
}
