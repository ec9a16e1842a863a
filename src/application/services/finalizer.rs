use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    LockStore, LockStoreError, ReportExchange, ReportSink, ReportSinkError, RepositoryError,
    SessionRepository, TranscriptReport, TurnRepository,
};
use crate::domain::scenarios::canonical_stage_name;
use crate::domain::{CatalogRegistry, Session, SessionId, TurnLogEntry};

/// Heavy-lane consumer of `finalize_session`. Builds the transcript report
/// and hands it to the report sink once per session.
pub struct Finalizer {
    catalogs: CatalogRegistry,
    sessions: Arc<dyn SessionRepository>,
    turns: Arc<dyn TurnRepository>,
    lock_store: Arc<dyn LockStore>,
    report_sink: Arc<dyn ReportSink>,
    dedup_window: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Submitted { exchanges: usize },
    Duplicate,
}

impl Finalizer {
    pub fn new(
        catalogs: CatalogRegistry,
        sessions: Arc<dyn SessionRepository>,
        turns: Arc<dyn TurnRepository>,
        lock_store: Arc<dyn LockStore>,
        report_sink: Arc<dyn ReportSink>,
        dedup_window: Duration,
    ) -> Self {
        Self {
            catalogs,
            sessions,
            turns,
            lock_store,
            report_sink,
            dedup_window,
        }
    }

    #[tracing::instrument(skip(self), fields(session_id = %session_id))]
    pub async fn finalize(&self, session_id: SessionId) -> Result<FinalizeOutcome, FinalizeError> {
        let key = format!("finalize:{}", session_id);
        if !self
            .lock_store
            .try_set_if_absent(&key, self.dedup_window)
            .await?
        {
            tracing::info!("Finalization already ran for session");
            return Ok(FinalizeOutcome::Duplicate);
        }

        let result = self.submit(session_id).await;
        if result.is_err() {
            if let Err(e) = self.lock_store.release(&key).await {
                tracing::warn!(error = %e, "Failed to release finalize lock after failure");
            }
        }
        result
    }

    async fn submit(&self, session_id: SessionId) -> Result<FinalizeOutcome, FinalizeError> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(FinalizeError::SessionNotFound(session_id))?;
        let log = self.turns.load_log(session_id).await?;

        let report = self.build_report(&session, &log);
        let exchanges = report.exchanges.len();
        self.report_sink.submit(session_id, &report).await?;

        tracing::info!(exchanges, "Transcript report submitted");
        Ok(FinalizeOutcome::Submitted { exchanges })
    }

    /// Pairs every AI question with the candidate turns that answered it,
    /// in log order.
    pub fn build_report(&self, session: &Session, log: &[TurnLogEntry]) -> TranscriptReport {
        let catalog = self.catalogs.get(session.catalog_id);
        let mut exchanges: Vec<(Option<uuid::Uuid>, ReportExchange)> = Vec::new();

        for entry in log {
            let question_id = entry.turn.question_id.map(|q| q.as_uuid());
            if entry.turn.is_ai() {
                let stage = entry
                    .stage
                    .as_deref()
                    .map(canonical_stage_name)
                    .unwrap_or("unknown")
                    .to_string();
                let evaluation_category = catalog
                    .get(&stage)
                    .and_then(|s| s.evaluation_category.clone());
                exchanges.push((
                    question_id,
                    ReportExchange {
                        stage,
                        evaluation_category,
                        question: entry.turn.text.clone(),
                        answers: Vec::new(),
                    },
                ));
            } else if let Some((_, exchange)) = exchanges
                .iter_mut()
                .rev()
                .find(|(id, _)| question_id.is_none() || *id == question_id)
            {
                exchange.answers.push(entry.turn.text.clone());
            }
        }

        TranscriptReport {
            session_id: session.id.to_string(),
            candidate_name: session.candidate_name.clone(),
            target_role: session.target_role.clone(),
            catalog: catalog.id().as_str().to_string(),
            catalog_version: catalog.version().to_string(),
            exchanges: exchanges.into_iter().map(|(_, e)| e).collect(),
            completed_at: session.completed_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("lock store: {0}")]
    LockStore(#[from] LockStoreError),
    #[error("report sink: {0}")]
    ReportSink(#[from] ReportSinkError),
}
