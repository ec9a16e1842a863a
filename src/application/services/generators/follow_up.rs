use std::sync::Arc;
use std::time::Duration;

use super::{
    Generated, answer_excerpt, clean_model_output, context_section, fallback_follow_up,
    interviewer_preamble,
};
use crate::application::ports::{LlmClient, Prompt, RetrievedContext};
use crate::domain::{Session, StageDefinition};

const CITATION_RULE: &str = "Open by quoting a short phrase from the candidate's answer exactly \
as they said it, in double quotes, for example: You mentioned \"...\". Then ask one question \
that builds on it.";

/// Model-backed follow-up that must cite the candidate's latest answer.
pub struct FollowUpGenerator {
    llm_client: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl FollowUpGenerator {
    pub fn new(llm_client: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self {
            llm_client,
            timeout,
        }
    }

    pub fn build_prompt(
        session: &Session,
        stage: &StageDefinition,
        answer: &str,
        context: &[RetrievedContext],
    ) -> Prompt {
        let system = format!(
            "{}\n\n{}\n\n{}",
            interviewer_preamble(session, stage),
            CITATION_RULE,
            context_section(context)
        );
        let user = format!(
            "The candidate just answered:\n\"\"\"\n{}\n\"\"\"\n\nWrite the follow-up question.",
            answer.trim()
        );
        Prompt::new(system, user)
    }

    #[tracing::instrument(skip_all, fields(session_id = %session.id, stage = %stage.name))]
    pub async fn generate(
        &self,
        session: &Session,
        stage: &StageDefinition,
        answer: &str,
        context: &[RetrievedContext],
    ) -> Generated {
        let prompt = Self::build_prompt(session, stage, answer, context);

        let raw = match tokio::time::timeout(self.timeout, self.llm_client.complete(&prompt)).await
        {
            Ok(Ok(raw)) => raw,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Follow-up generation failed, using fallback");
                return Generated::fallback(fallback_follow_up(answer));
            }
            Err(_) => {
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Follow-up generation timed out, using fallback"
                );
                return Generated::fallback(fallback_follow_up(answer));
            }
        };

        let Some(text) = clean_model_output(&raw) else {
            tracing::warn!(raw_chars = raw.len(), "Malformed model output, using fallback");
            return Generated::fallback(fallback_follow_up(answer));
        };

        if cites_answer(&text, answer) {
            return Generated::model(text);
        }

        match answer_excerpt(answer) {
            Some(excerpt) => {
                tracing::debug!("Follow-up did not quote the answer, prefixing citation");
                Generated::model(format!("You mentioned \"{}\". {}", excerpt, text))
            }
            None => Generated::model(text),
        }
    }
}

/// Whether any double-quoted span in `text` appears verbatim in `answer`.
fn cites_answer(text: &str, answer: &str) -> bool {
    let normalized = text.replace(['\u{201c}', '\u{201d}'], "\"");
    let answer_lower = answer.to_lowercase();
    normalized
        .split('"')
        .skip(1)
        .step_by(2)
        .map(|quoted| quoted.trim_matches(|c: char| c.is_whitespace() || c == '.' || c == ','))
        .filter(|quoted| quoted.chars().count() >= 3)
        .any(|quoted| answer_lower.contains(&quoted.to_lowercase()))
}
