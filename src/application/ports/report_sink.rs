use async_trait::async_trait;
use serde::Serialize;

use crate::domain::SessionId;

#[derive(Debug, Clone, Serialize)]
pub struct TranscriptReport {
    pub session_id: String,
    pub candidate_name: String,
    pub target_role: String,
    pub catalog: String,
    pub catalog_version: String,
    pub exchanges: Vec<ReportExchange>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportExchange {
    pub stage: String,
    pub evaluation_category: Option<String>,
    pub question: String,
    pub answers: Vec<String>,
}

/// Downstream consumer of finished transcripts (report generation).
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn submit(
        &self,
        session_id: SessionId,
        report: &TranscriptReport,
    ) -> Result<(), ReportSinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReportSinkError {
    #[error("report submission failed: {0}")]
    SubmissionFailed(String),
}
