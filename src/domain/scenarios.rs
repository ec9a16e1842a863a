//! Built-in interview scripts and the stage-name history they carry.

use super::{Catalog, CatalogError, CatalogId, CatalogRegistry, StageDefinition};

pub const CATALOG_VERSION: &str = "2024.3";

/// Stage names used by earlier catalog revisions, mapped onto their current
/// equivalents. Historical turn logs still reference the left-hand names.
pub const LEGACY_STAGE_RENAMES: &[(&str, &str)] = &[
    ("greeting", "intro"),
    ("self_intro", "intro"),
    ("why_apply", "motivation"),
    ("motivation_fit", "motivation"),
    ("job_experience", "experience"),
    ("project_experience", "experience"),
    ("experience_follow_up", "experience_followup"),
    ("tech_skill", "technical"),
    ("technical_skill", "technical"),
    ("tech_follow_up", "technical_followup"),
    ("situation", "problem_solving"),
    ("teamwork", "collaboration"),
    ("teamwork_follow_up", "collaboration_followup"),
    ("career_change_reason", "transition_reason"),
    ("transferable_skill", "transferable_skills"),
    ("transferable_follow_up", "transferable_skills_followup"),
    ("self_study", "learning"),
    ("wrap_up", "closing"),
    ("final_question", "closing"),
];

pub fn canonical_stage_name(name: &str) -> &str {
    LEGACY_STAGE_RENAMES
        .iter()
        .find(|(legacy, _)| *legacy == name)
        .map(|(_, current)| *current)
        .unwrap_or(name)
}

const INTRO: &str = "Hello {candidate_name}, thank you for joining today's interview for the \
{target_role} position. To start, could you briefly introduce yourself?";

const MOTIVATION: &str = "What made you decide to apply for the {target_role} role at \
{organization}, and what do you hope to achieve here?";

const CLOSING: &str = "That covers everything I wanted to ask, {candidate_name}. Before we \
finish, is there anything you would like to add or ask us?";

pub fn standard_catalog() -> Result<Catalog, CatalogError> {
    Catalog::new(
        CatalogId::Standard,
        CATALOG_VERSION,
        vec![
            StageDefinition::template("intro", 1, INTRO).with_category("communication"),
            StageDefinition::template("motivation", 2, MOTIVATION).with_category("motivation"),
            StageDefinition::generated(
                "experience",
                3,
                "{target_role} project experience and responsibilities",
                "Ask about one concrete project from the resume that is most relevant to \
                 the {target_role} role. Ask what the candidate personally owned and what \
                 the outcome was.",
            )
            .with_category("experience"),
            StageDefinition::follow_up(
                "experience_followup",
                4,
                "experience",
                "Dig into a decision the candidate just described: why it was made, which \
                 alternatives were considered and what they would change now.",
            )
            .with_retrieval_query("{target_role} project decisions, trade-offs and alternatives")
            .with_category("experience"),
            StageDefinition::generated(
                "technical",
                5,
                "{target_role} technical skills tools and frameworks",
                "Ask one technical question that checks depth in a skill the resume claims \
                 and that the {target_role} role depends on. Avoid trivia.",
            )
            .with_category("technical"),
            StageDefinition::follow_up(
                "technical_followup",
                6,
                "technical",
                "Probe the weakest or vaguest point of the previous technical answer with a \
                 narrower question.",
            )
            .with_category("technical"),
            StageDefinition::generated(
                "problem_solving",
                7,
                "{target_role} challenges incidents and troubleshooting",
                "Pose a realistic situational problem a {target_role} would face and ask \
                 how the candidate would approach it step by step.",
            )
            .with_category("problem_solving"),
            StageDefinition::generated(
                "collaboration",
                8,
                "teamwork conflict communication",
                "Ask about a time the candidate had to work through a disagreement or \
                 coordinate across a team.",
            )
            .with_category("collaboration"),
            StageDefinition::follow_up(
                "collaboration_followup",
                9,
                "collaboration",
                "Ask what the candidate learned from the situation they described and how \
                 it changed the way they work.",
            )
            .with_category("collaboration"),
            StageDefinition::terminal("closing", 10, CLOSING),
        ],
    )
}

pub fn transition_catalog() -> Result<Catalog, CatalogError> {
    Catalog::new(
        CatalogId::Transition,
        CATALOG_VERSION,
        vec![
            StageDefinition::template("intro", 1, INTRO).with_category("communication"),
            StageDefinition::template("motivation", 2, MOTIVATION).with_category("motivation"),
            StageDefinition::generated(
                "transition_reason",
                3,
                "{prior_field} background and reasons for career change",
                "The candidate comes from {prior_field} and is applying for {target_role}. \
                 Ask what triggered the move and why now.",
            )
            .with_category("motivation"),
            StageDefinition::generated(
                "transferable_skills",
                4,
                "{prior_field} experience transferable to {target_role}",
                "Ask which skills from {prior_field} the candidate expects to carry into the \
                 {target_role} role, with one concrete example.",
            )
            .with_category("experience"),
            StageDefinition::follow_up(
                "transferable_skills_followup",
                5,
                "transferable_skills",
                "Ask how the example just given would look in a {target_role} context and \
                 what would be different.",
            )
            .with_category("experience"),
            StageDefinition::generated(
                "learning",
                6,
                "{target_role} courses projects self study",
                "Ask what the candidate has done so far to build {target_role} skills: \
                 courses, side projects, certifications.",
            )
            .with_category("technical"),
            StageDefinition::follow_up(
                "learning_followup",
                7,
                "learning",
                "Ask for the hardest problem met during that learning and how it was solved.",
            )
            .with_category("technical"),
            StageDefinition::generated(
                "role_fit",
                8,
                "{target_role} day to day expectations",
                "Ask how the candidate pictures the first months in the {target_role} role \
                 and where they expect to need support.",
            )
            .with_category("problem_solving"),
            StageDefinition::terminal("closing", 9, CLOSING),
        ],
    )
}

pub fn builtin_registry() -> Result<CatalogRegistry, CatalogError> {
    CatalogRegistry::new(standard_catalog()?, transition_catalog()?)
}
