use super::render_template;
use crate::domain::{Session, StageDefinition};

const EXCERPT_MAX_WORDS: usize = 12;

const GENERIC: &str = "Could you tell me about an experience that best shows why you are a good \
fit for the {target_role} role?";

const BY_CATEGORY: &[(&str, &str)] = &[
    (
        "experience",
        "Could you walk me through a project you are proud of and the part you personally owned?",
    ),
    (
        "technical",
        "Which technical skill do you rely on most for {target_role} work, and how did you build it?",
    ),
    (
        "problem_solving",
        "Tell me about a difficult problem you solved recently and how you approached it.",
    ),
    (
        "collaboration",
        "Can you describe a time you worked through a disagreement with a teammate?",
    ),
    (
        "motivation",
        "What draws you to the {target_role} role at this point in your career?",
    ),
];

pub fn fallback_question(session: &Session, stage: &StageDefinition) -> String {
    let template = stage
        .evaluation_category
        .as_deref()
        .and_then(|category| BY_CATEGORY.iter().find(|(c, _)| *c == category))
        .map(|(_, text)| *text)
        .unwrap_or(GENERIC);
    render_template(template, &session.template_vars())
}

pub fn fallback_follow_up(answer: &str) -> String {
    match answer_excerpt(answer) {
        Some(excerpt) => format!(
            "You mentioned \"{}\". Could you go into more detail on that, and tell me what you \
             would do differently today?",
            excerpt
        ),
        None => "Could you expand on your previous answer with a concrete example?".to_string(),
    }
}

/// Verbatim opening of the answer's first sentence, at most a dozen words.
pub fn answer_excerpt(answer: &str) -> Option<String> {
    let first_sentence = answer
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|s| !s.is_empty())?;

    let mut words = 0;
    let mut end = 0;
    let mut in_word = false;
    for (idx, c) in first_sentence.char_indices() {
        if c.is_whitespace() {
            if in_word {
                words += 1;
                in_word = false;
                if words == EXCERPT_MAX_WORDS {
                    break;
                }
            }
        } else {
            in_word = true;
            end = idx + c.len_utf8();
        }
    }

    Some(first_sentence[..end].to_string())
}
