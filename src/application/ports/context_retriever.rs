use async_trait::async_trait;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedContext {
    pub text: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RetrievalQuery<'a> {
    pub query: &'a str,
    pub resume_id: Uuid,
    pub top_k: usize,
    pub category: Option<&'a str>,
}

/// Similarity search over a candidate's résumé chunks. An empty result is
/// a valid answer.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn retrieve(
        &self,
        query: RetrievalQuery<'_>,
    ) -> Result<Vec<RetrievedContext>, ContextRetrieverError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ContextRetrieverError {
    #[error("retrieval request failed: {0}")]
    RequestFailed(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
