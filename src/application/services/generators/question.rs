use std::sync::Arc;
use std::time::Duration;

use super::{Generated, clean_model_output, context_section, fallback_question, interviewer_preamble};
use crate::application::ports::{LlmClient, Prompt, RetrievedContext};
use crate::domain::{Session, StageDefinition};

/// Model-backed question for `generated` stages.
pub struct QuestionGenerator {
    llm_client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl QuestionGenerator {
    pub fn new(llm_client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self {
            llm_client,
            timeout,
        }
    }

    pub fn build_prompt(
        session: &Session,
        stage: &StageDefinition,
        context: &[RetrievedContext],
    ) -> Prompt {
        let system = format!(
            "{}\n\n{}",
            interviewer_preamble(session, stage),
            context_section(context)
        );
        let user = format!(
            "Write the next interview question for the \"{}\" stage.",
            stage.name
        );
        Prompt::new(system, user)
    }

    #[tracing::instrument(skip_all, fields(session_id = %session.id, stage = %stage.name, context_items = context.len()))]
    pub async fn generate(
        &self,
        session: &Session,
        stage: &StageDefinition,
        context: &[RetrievedContext],
    ) -> Generated {
        let prompt = Self::build_prompt(session, stage, context);

        let raw = match tokio::time::timeout(self.timeout, self.llm_client.complete(&prompt)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Question generation failed, using fallback");
                return Generated::fallback(fallback_question(session, stage));
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Question generation timed out, using fallback"
                );
                return Generated::fallback(fallback_question(session, stage));
            }
        };

        match clean_model_output(&raw) {
            Some(text) => Generated::model(text),
            None => {
                tracing::warn!(raw_chars = raw.len(), "Malformed model output, using fallback");
                Generated::fallback(fallback_question(session, stage))
            }
        }
    }
}
