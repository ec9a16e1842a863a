use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::ports::{
    ContextRetriever, ContextRetrieverError, RetrievalQuery, RetrievedContext,
};

/// Keyword-overlap search over chunks registered per résumé.
#[derive(Default)]
pub struct InMemoryContextRetriever {
    chunks: RwLock<HashMap<Uuid, Vec<RetrievedContext>>>,
}

impl InMemoryContextRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_chunk(&self, resume_id: Uuid, text: impl Into<String>, category: Option<&str>) {
        self.chunks
            .write()
            .await
            .entry(resume_id)
            .or_default()
            .push(RetrievedContext {
                text: text.into(),
                category: category.map(String::from),
            });
    }
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.len() > 2)
        .map(|w| w.to_lowercase())
        .collect()
}

#[async_trait]
impl ContextRetriever for InMemoryContextRetriever {
    async fn retrieve(
        &self,
        query: RetrievalQuery<'_>,
    ) -> Result<Vec<RetrievedContext>, ContextRetrieverError> {
        let chunks = self.chunks.read().await;
        let Some(candidates) = chunks.get(&query.resume_id) else {
            return Ok(Vec::new());
        };

        let wanted = terms(query.query);
        let mut scored: Vec<(usize, &RetrievedContext)> = candidates
            .iter()
            .filter(|c| query.category.is_none() || c.category.as_deref() == query.category)
            .map(|c| (terms(&c.text).intersection(&wanted).count(), c))
            .filter(|(score, _)| *score > 0)
            .collect();
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(query.top_k)
            .map(|(_, c)| c.clone())
            .collect())
    }
}
