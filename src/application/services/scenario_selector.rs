//! Standard-vs-transition classification.
//!
//! This is a hand-tuned keyword heuristic, not a classifier: a role is
//! matched against a few keyword families, and the prior field is then
//! checked for any keyword the family considers relevant background.

use crate::domain::CatalogId;

struct RoleFamily {
    name: &'static str,
    role_keywords: &'static [&'static str],
    relevant_background: &'static [&'static str],
}

const ROLE_FAMILIES: &[RoleFamily] = &[
    RoleFamily {
        name: "security",
        role_keywords: &["security", "secops", "penetration", "pentester", "soc", "cyber"],
        relevant_background: &[
            "security", "network", "networking", "infrastructure", "system", "systems",
            "computer", "software", "it", "cloud", "devops", "cyber",
        ],
    },
    RoleFamily {
        name: "data_ai",
        role_keywords: &[
            "data", "ai", "ml", "machine learning", "analytics", "analyst", "scientist",
            "deep learning",
        ],
        relevant_background: &[
            "data", "statistics", "statistical", "math", "mathematics", "computer", "software",
            "analytics", "physics", "economics", "industrial engineering", "ai",
            "machine learning",
        ],
    },
    RoleFamily {
        name: "software",
        role_keywords: &[
            "software", "developer", "engineer", "backend", "frontend", "full stack",
            "fullstack", "programmer", "devops", "mobile",
        ],
        relevant_background: &[
            "computer", "software", "programming", "engineering", "information", "it",
            "electronic", "electronics", "electrical", "developer",
        ],
    },
];

const BROAD_TECHNICAL: &[&str] = &[
    "computer", "software", "engineering", "engineer", "science", "it", "information",
    "math", "mathematics", "data", "technology", "electronic", "electrical", "developer",
];

/// Picks the catalog a new session is bound to. Pure; empty input is
/// treated as a mismatch.
pub fn select(prior_field: &str, target_role: &str) -> CatalogId {
    let prior = normalize(prior_field);
    let role = normalize(target_role);

    if prior.trim().is_empty() || role.trim().is_empty() {
        return CatalogId::Transition;
    }

    match matched_family(&role) {
        Some(family) => {
            if contains_any(&prior, family.relevant_background) {
                CatalogId::Standard
            } else {
                CatalogId::Transition
            }
        }
        None => {
            if contains_any(&role, BROAD_TECHNICAL) && !contains_any(&prior, BROAD_TECHNICAL) {
                CatalogId::Transition
            } else {
                CatalogId::Standard
            }
        }
    }
}

/// Name of the keyword family a role falls into, if any.
pub fn role_family(target_role: &str) -> Option<&'static str> {
    matched_family(&normalize(target_role)).map(|f| f.name)
}

fn matched_family(role: &str) -> Option<&'static RoleFamily> {
    ROLE_FAMILIES
        .iter()
        .find(|family| contains_any(role, family.role_keywords))
}

/// Lowercases and collapses every non-alphanumeric run into one space,
/// padded so keywords can be matched on word boundaries.
fn normalize(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    format!(" {} ", words.join(" "))
}

fn contains_any(normalized: &str, keywords: &[&str]) -> bool {
    keywords
        .iter()
        .any(|kw| normalized.contains(&format!(" {} ", kw)))
}
