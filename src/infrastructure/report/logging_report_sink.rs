use async_trait::async_trait;

use crate::application::ports::{ReportSink, ReportSinkError, TranscriptReport};
use crate::domain::SessionId;

/// Used when no report service is configured.
pub struct LoggingReportSink;

#[async_trait]
impl ReportSink for LoggingReportSink {
    async fn submit(
        &self,
        session_id: SessionId,
        report: &TranscriptReport,
    ) -> Result<(), ReportSinkError> {
        let payload = serde_json::to_string(report)
            .map_err(|e| ReportSinkError::SubmissionFailed(e.to_string()))?;
        tracing::info!(
            session_id = %session_id,
            exchanges = report.exchanges.len(),
            payload_bytes = payload.len(),
            "Transcript report ready (no report sink configured)"
        );
        Ok(())
    }
}
