use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{CandidateId, CatalogId, SessionId, SessionStatus};

#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub prior_field: String,
    pub target_role: String,
    pub organization: Option<String>,
    pub resume_id: Option<Uuid>,
    pub catalog_id: CatalogId,
    pub status: SessionStatus,
    pub current_stage: Option<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Caller-supplied attributes for a new session. The catalog is chosen
/// by the scenario selector, never by the caller.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub candidate_id: CandidateId,
    pub candidate_name: String,
    pub prior_field: String,
    pub target_role: String,
    pub organization: Option<String>,
    pub resume_id: Option<Uuid>,
}

impl Session {
    pub fn new(attrs: NewSession, catalog_id: CatalogId) -> Self {
        Self {
            id: SessionId::new(),
            candidate_id: attrs.candidate_id,
            candidate_name: attrs.candidate_name,
            prior_field: attrs.prior_field,
            target_role: attrs.target_role,
            organization: attrs.organization,
            resume_id: attrs.resume_id,
            catalog_id,
            status: SessionStatus::Scheduled,
            current_stage: None,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Template variables available to rendered stages and prompt guides.
    pub fn template_vars(&self) -> Vec<(&'static str, String)> {
        vec![
            ("candidate_name", self.candidate_name.clone()),
            ("target_role", self.target_role.clone()),
            ("prior_field", self.prior_field.clone()),
            (
                "organization",
                self.organization
                    .clone()
                    .unwrap_or_else(|| "our organization".to_string()),
            ),
        ]
    }
}
