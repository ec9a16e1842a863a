use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use super::generators::{FollowUpGenerator, Generated, QuestionGenerator, render_template};
use crate::application::ports::{ContextRetriever, LlmClient, RetrievalQuery, RetrievedContext};
use crate::domain::{Catalog, ProducedQuestion, Session, StageDefinition, StageType};

/// Picks the generator for a stage's type and wraps its text in a
/// [`ProducedQuestion`]. Nothing here fails; persistence is the caller's job.
pub struct StageProducer {
    retriever: Arc<dyn ContextRetriever>,
    question_generator: QuestionGenerator,
    follow_up_generator: FollowUpGenerator,
    top_k: usize,
    retrieval_timeout: Duration,
}

impl StageProducer {
    pub fn new(
        llm_client: Arc<dyn LlmClient>,
        retriever: Arc<dyn ContextRetriever>,
        generation_timeout: Duration,
        top_k: usize,
    ) -> Self {
        Self {
            retriever,
            question_generator: QuestionGenerator::new(
                Arc::clone(&llm_client),
                generation_timeout,
            ),
            follow_up_generator: FollowUpGenerator::new(llm_client, generation_timeout),
            top_k,
            retrieval_timeout: generation_timeout,
        }
    }

    #[tracing::instrument(skip_all, fields(session_id = %session.id, stage = %stage.name, stage_type = %stage.stage_type))]
    pub async fn produce(
        &self,
        session: &Session,
        catalog: &Catalog,
        stage: &StageDefinition,
        latest_answer: Option<&str>,
    ) -> ProducedQuestion {
        let vars = session.template_vars();

        let (generated, context_items) = if stage.stage_type.is_rendered() {
            let template = stage.text_template.as_deref().unwrap_or_default();
            let generated = Generated {
                text: render_template(template, &vars),
                used_fallback: false,
            };
            (generated, 0)
        } else if stage.stage_type == StageType::FollowUp {
            let query = stage
                .parent
                .as_deref()
                .and_then(|parent| catalog.get(parent))
                .map(|parent| parent.retrieval_query.as_str())
                .filter(|_| stage.retrieval_query.is_empty())
                .unwrap_or(stage.retrieval_query.as_str());
            let context = self.retrieve(session, query).await;
            let generated = self
                .follow_up_generator
                .generate(session, stage, latest_answer.unwrap_or_default(), &context)
                .await;
            (generated, context.len())
        } else {
            let context = self.retrieve(session, &stage.retrieval_query).await;
            let generated = self
                .question_generator
                .generate(session, stage, &context)
                .await;
            (generated, context.len())
        };

        let metadata = json!({
            "catalog": catalog.id().as_str(),
            "catalog_version": catalog.version(),
            "stage_type": stage.stage_type.as_str(),
            "order": stage.order,
            "guide": render_template(&stage.guide, &vars),
            "rubric": stage.evaluation_category,
            "parent": stage.parent,
            "context_items": context_items,
            "fallback": generated.used_fallback,
        });

        ProducedQuestion::new(
            session.id,
            stage.name.clone(),
            generated.text,
            stage.evaluation_category.clone(),
            metadata,
        )
    }

    /// Résumé context for a query. Failures and timeouts degrade to no
    /// context.
    async fn retrieve(&self, session: &Session, query_template: &str) -> Vec<RetrievedContext> {
        let Some(resume_id) = session.resume_id else {
            return Vec::new();
        };
        let query = render_template(query_template, &session.template_vars());
        if query.trim().is_empty() {
            return Vec::new();
        }

        let request = RetrievalQuery {
            query: &query,
            resume_id,
            top_k: self.top_k,
            category: None,
        };

        match tokio::time::timeout(self.retrieval_timeout, self.retriever.retrieve(request)).await {
            Ok(Ok(context)) => context,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Context retrieval failed, generating without context");
                Vec::new()
            }
            Err(_) => {
                tracing::warn!("Context retrieval timed out, generating without context");
                Vec::new()
            }
        }
    }
}
