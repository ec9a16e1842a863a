use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ContextRetriever, ContextRetrieverError, RetrievalQuery, RetrievedContext,
};

/// Résumé search served by the document retrieval service.
pub struct HttpContextRetriever {
    client: reqwest::Client,
    url: String,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    resume_id: uuid::Uuid,
    top_k: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    text: String,
    #[serde(default)]
    category: Option<String>,
}

impl HttpContextRetriever {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ContextRetriever for HttpContextRetriever {
    #[tracing::instrument(skip_all, fields(resume_id = %query.resume_id, top_k = query.top_k))]
    async fn retrieve(
        &self,
        query: RetrievalQuery<'_>,
    ) -> Result<Vec<RetrievedContext>, ContextRetrieverError> {
        let body = SearchRequest {
            query: query.query,
            resume_id: query.resume_id,
            top_k: query.top_k,
            category: query.category,
        };

        let response = self
            .client
            .post(format!("{}/search", self.url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ContextRetrieverError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ContextRetrieverError::RequestFailed(format!(
                "HTTP {}",
                response.status()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| ContextRetrieverError::InvalidResponse(e.to_string()))?;

        tracing::debug!(hits = parsed.results.len(), "Résumé context retrieved");
        Ok(parsed
            .results
            .into_iter()
            .take(query.top_k)
            .map(|hit| RetrievedContext {
                text: hit.text,
                category: hit.category,
            })
            .collect())
    }
}
