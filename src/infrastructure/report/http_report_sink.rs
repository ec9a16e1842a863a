use async_trait::async_trait;

use crate::application::ports::{ReportSink, ReportSinkError, TranscriptReport};
use crate::domain::SessionId;

/// Lets the report service deduplicate retried submissions per session.
pub const SESSION_ID_HEADER: &str = "x-session-id";

/// Posts finished transcripts to the report generation service.
pub struct HttpReportSink {
    client: reqwest::Client,
    url: String,
}

impl HttpReportSink {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl ReportSink for HttpReportSink {
    #[tracing::instrument(skip_all, fields(session_id = %session_id))]
    async fn submit(
        &self,
        session_id: SessionId,
        report: &TranscriptReport,
    ) -> Result<(), ReportSinkError> {
        let response = self
            .client
            .post(&self.url)
            .header(SESSION_ID_HEADER, session_id.to_string())
            .json(report)
            .send()
            .await
            .map_err(|e| ReportSinkError::SubmissionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ReportSinkError::SubmissionFailed(format!(
                "HTTP {}: {}",
                status, body
            )));
        }
        Ok(())
    }
}
