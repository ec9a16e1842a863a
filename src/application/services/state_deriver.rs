use std::sync::Arc;

use crate::application::ports::{RepositoryError, TurnRepository};
use crate::domain::scenarios::canonical_stage_name;
use crate::domain::{Catalog, SessionId, Speaker, TurnLogEntry};

/// Reconstructs session progress from the turn log alone.
pub struct StateDeriver {
    turns: Arc<dyn TurnRepository>,
}

impl StateDeriver {
    pub fn new(turns: Arc<dyn TurnRepository>) -> Self {
        Self { turns }
    }

    #[tracing::instrument(skip(self, catalog), fields(session_id = %session_id, catalog = %catalog.id()))]
    pub async fn last_answered_stage(
        &self,
        session_id: SessionId,
        catalog: &Catalog,
    ) -> Result<Option<String>, RepositoryError> {
        let log = self.turns.load_log(session_id).await?;
        Ok(derive_last_answered_stage(&log, catalog))
    }
}

/// Name of the stage the candidate last answered, or `None` for "start of
/// catalog".
///
/// Without any candidate turn the latest AI turn is used instead; when that
/// turn asked the catalog's second stage (emitted together with the first at
/// session open) the first stage is reported. Legacy stage names are folded
/// onto current ones. A missing question link or a name the catalog does
/// not know yields `None`.
pub fn derive_last_answered_stage(log: &[TurnLogEntry], catalog: &Catalog) -> Option<String> {
    let latest_of = |speaker: Speaker| {
        log.iter()
            .filter(|e| e.turn.speaker == speaker)
            .max_by_key(|e| (e.turn.order, e.turn.insertion_id))
    };

    let raw = match latest_of(Speaker::Candidate) {
        Some(entry) => linked_stage(entry)?,
        None => {
            let entry = latest_of(Speaker::Ai)?;
            let stage = linked_stage(entry)?;
            let canonical = canonical_stage_name(&stage);
            match catalog.second() {
                Some(second) if second.name == canonical => catalog.first().name.clone(),
                _ => stage,
            }
        }
    };

    let canonical = canonical_stage_name(&raw);
    if catalog.contains(canonical) {
        Some(canonical.to_string())
    } else {
        tracing::warn!(
            stage = %raw,
            catalog = %catalog.id(),
            "Stage unknown to bound catalog, treating as start of catalog"
        );
        None
    }
}

fn linked_stage(entry: &TurnLogEntry) -> Option<String> {
    if entry.stage.is_none() {
        tracing::warn!(
            turn_id = %entry.turn.id,
            order = entry.turn.order,
            speaker = %entry.turn.speaker,
            "Turn has no linked question, treating as start of catalog"
        );
    }
    entry.stage.clone()
}
