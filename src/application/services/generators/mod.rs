//! Stage-type-specific question producers. None of them fail: on any
//! internal problem an on-topic fallback question is returned instead.

mod fallback;
mod follow_up;
mod question;
mod template;

pub use fallback::{answer_excerpt, fallback_follow_up, fallback_question};
pub use follow_up::FollowUpGenerator;
pub use question::QuestionGenerator;
pub use template::render_template;

use crate::application::ports::RetrievedContext;
use crate::domain::{Session, StageDefinition};

const MAX_QUESTION_CHARS: usize = 800;
const LEADING_LABELS: &[&str] = &["question:", "q:", "interviewer:", "follow-up:", "follow up:"];

/// Text produced for a stage, and whether the fallback had to be used.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub used_fallback: bool,
}

impl Generated {
    fn model(text: String) -> Self {
        Self {
            text,
            used_fallback: false,
        }
    }

    fn fallback(text: String) -> Self {
        Self {
            text,
            used_fallback: true,
        }
    }
}

fn interviewer_preamble(session: &Session, stage: &StageDefinition) -> String {
    let vars = session.template_vars();
    let guide = render_template(&stage.guide, &vars);
    let organization = session
        .organization
        .as_deref()
        .map(|org| format!(" at {}", org))
        .unwrap_or_default();

    format!(
        "You are a professional interviewer running a spoken job interview for the {role} \
         position{organization}. The candidate is {name}, whose background is in {prior}.\n\
         Ask exactly one question. Reply with the question only: no preamble, no numbering, \
         no answer suggestions. Keep it under three sentences so it can be read aloud.\n\n\
         Stage: {stage}\nGuide: {guide}",
        role = session.target_role,
        name = session.candidate_name,
        prior = session.prior_field,
        stage = stage.name,
    )
}

fn context_section(context: &[RetrievedContext]) -> String {
    if context.is_empty() {
        return "No résumé excerpts are available. Base the question on the role itself."
            .to_string();
    }

    let excerpts = context
        .iter()
        .map(|c| match &c.category {
            Some(category) => format!("- [{}] {}", category, c.text.trim()),
            None => format!("- {}", c.text.trim()),
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("Relevant résumé excerpts:\n{}", excerpts)
}

/// Normalizes raw model output into a single askable question, or `None`
/// when the output is unusable.
fn clean_model_output(raw: &str) -> Option<String> {
    let mut text = raw.split_whitespace().collect::<Vec<_>>().join(" ");

    loop {
        let lower = text.to_lowercase();
        match LEADING_LABELS.iter().find(|label| lower.starts_with(*label)) {
            Some(label) => text = text[label.len()..].trim_start().to_string(),
            None => break,
        }
    }

    let unquoted = text
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .filter(|inner| !inner.contains('"'))
        .map(str::to_string);
    if let Some(inner) = unquoted {
        text = inner;
    }

    let text = text.trim().to_string();
    if text.is_empty() || text.chars().count() > MAX_QUESTION_CHARS {
        return None;
    }
    Some(text)
}
