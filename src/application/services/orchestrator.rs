use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use super::state_deriver::derive_last_answered_stage;
use super::{CompletionDetector, StageProducer, SynthesisService};
use crate::application::ports::{
    LockStore, LockStoreError, RepositoryError, SessionRepository, TurnRepository,
};
use crate::domain::{
    Catalog, CatalogRegistry, NewTurn, ProducedQuestion, QuestionId, Session, SessionId,
    SessionStatus, StageDefinition, StageType, Turn, TurnId, TurnLogEntry,
};

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// An AI turn younger than this means another trigger already answered
    /// the latest candidate turn.
    pub race_grace: Duration,
    /// Upper bound on how long one `advance` may hold the session lease.
    pub session_lease_ttl: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            race_grace: Duration::from_secs(3),
            session_lease_ttl: Duration::from_secs(120),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    AiJustSpoke,
    AlreadyExists,
    SessionLocked,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AiJustSpoke => "ai_just_spoke",
            SkipReason::AlreadyExists => "already_exists",
            SkipReason::SessionLocked => "session_locked",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AdvanceOutcome {
    Produced {
        stage: String,
        stage_type: StageType,
        question_id: QuestionId,
        turn_id: TurnId,
        used_fallback: bool,
        reused: bool,
    },
    Completed,
    Skipped(SkipReason),
}

/// Decides, after each candidate answer, which stage comes next and
/// produces it at most once.
pub struct Orchestrator {
    catalogs: CatalogRegistry,
    sessions: Arc<dyn SessionRepository>,
    turns: Arc<dyn TurnRepository>,
    lock_store: Arc<dyn LockStore>,
    producer: Arc<StageProducer>,
    synthesis: Arc<SynthesisService>,
    completion: CompletionDetector,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalogs: CatalogRegistry,
        sessions: Arc<dyn SessionRepository>,
        turns: Arc<dyn TurnRepository>,
        lock_store: Arc<dyn LockStore>,
        producer: Arc<StageProducer>,
        synthesis: Arc<SynthesisService>,
        completion: CompletionDetector,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            catalogs,
            sessions,
            turns,
            lock_store,
            producer,
            synthesis,
            completion,
            settings,
        }
    }

    #[tracing::instrument(skip(self), fields(session_id = %session_id))]
    pub async fn advance(&self, session_id: SessionId) -> Result<AdvanceOutcome, OrchestratorError> {
        let session = self
            .sessions
            .get_by_id(session_id)
            .await?
            .ok_or(OrchestratorError::SessionNotFound(session_id))?;

        if session.status == SessionStatus::Completed {
            tracing::debug!("Session already completed, nothing to advance");
            return Ok(AdvanceOutcome::Completed);
        }

        if let Some(latest) = self.turns.latest_turn(session_id).await? {
            if latest.is_ai() && self.within_grace(&latest) {
                tracing::info!(turn_id = %latest.id, "AI spoke moments ago, skipping advance");
                return Ok(AdvanceOutcome::Skipped(SkipReason::AiJustSpoke));
            }
        }

        let Some(lease) = SessionLease::acquire(
            Arc::clone(&self.lock_store),
            session_id,
            self.settings.session_lease_ttl,
        )
        .await?
        else {
            tracing::info!("Another advance holds the session lease, skipping");
            return Ok(AdvanceOutcome::Skipped(SkipReason::SessionLocked));
        };

        let result = self.advance_leased(&session).await;
        lease.release().await;

        let outcome = result?;
        match &outcome {
            AdvanceOutcome::Produced {
                stage,
                question_id,
                used_fallback,
                reused,
                ..
            } => {
                tracing::info!(
                    stage = %stage,
                    question_id = %question_id,
                    fallback = used_fallback,
                    reused = reused,
                    "Stage produced"
                );
                self.request_speech(session_id, *question_id).await;
            }
            AdvanceOutcome::Skipped(reason) => {
                tracing::info!(reason = reason.as_str(), "Advance skipped");
            }
            AdvanceOutcome::Completed => {}
        }

        Ok(outcome)
    }

    fn within_grace(&self, turn: &Turn) -> bool {
        let age = Utc::now().signed_duration_since(turn.created_at);
        age.to_std()
            .map(|age| age < self.settings.race_grace)
            .unwrap_or(true)
    }

    async fn advance_leased(&self, session: &Session) -> Result<AdvanceOutcome, OrchestratorError> {
        let catalog = self.catalogs.get(session.catalog_id);
        let log = self.turns.load_log(session.id).await?;
        let last_answered = derive_last_answered_stage(&log, &catalog);
        let latest_answer = latest_answer(&log);

        tracing::debug!(
            last_answered = last_answered.as_deref().unwrap_or("<start>"),
            turns = log.len(),
            "Derived session state"
        );

        let Some(stage) = next_stage(&catalog, last_answered.as_deref(), latest_answer) else {
            self.completion.complete(session).await?;
            return Ok(AdvanceOutcome::Completed);
        };

        if self.turns.stage_has_turn(session.id, &stage.name).await? {
            tracing::debug!(stage = %stage.name, "Stage already asked");
            return Ok(AdvanceOutcome::Skipped(SkipReason::AlreadyExists));
        }

        if let Some(existing) = self.turns.find_question(session.id, &stage.name).await? {
            let outcome = self.ask_existing(session, stage, existing).await?;
            self.ensure_live(session).await;
            return Ok(outcome);
        }

        let question = self
            .producer
            .produce(session, &catalog, stage, latest_answer)
            .await;
        let used_fallback = question
            .metadata
            .get("fallback")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        let turn = NewTurn::ai(session.id, question.id, question.content.clone());

        let outcome = match self.turns.append_question_turn(&question, &turn).await {
            Ok(turn) => AdvanceOutcome::Produced {
                stage: stage.name.clone(),
                stage_type: stage.stage_type,
                question_id: question.id,
                turn_id: turn.id,
                used_fallback,
                reused: false,
            },
            Err(e) if e.is_constraint_violation() => {
                tracing::info!(stage = %stage.name, "Question written concurrently, discarding ours");
                return Ok(AdvanceOutcome::Skipped(SkipReason::AlreadyExists));
            }
            Err(e) => return Err(OrchestratorError::Persistence(e)),
        };

        self.ensure_live(session).await;
        Ok(outcome)
    }

    /// A session advanced without an explicit start goes live with its
    /// first produced stage.
    async fn ensure_live(&self, session: &Session) {
        if session.status != SessionStatus::Scheduled {
            return;
        }
        if let Err(e) = self.sessions.mark_live(session.id, Utc::now()).await {
            tracing::warn!(error = %e, "Failed to mark session live");
        }
    }

    /// Asks a question that was produced ahead of time (the eagerly produced
    /// opening stages) without regenerating it.
    async fn ask_existing(
        &self,
        session: &Session,
        stage: &StageDefinition,
        question: ProducedQuestion,
    ) -> Result<AdvanceOutcome, OrchestratorError> {
        let turn = NewTurn::ai(session.id, question.id, question.content.clone());
        let turn = self
            .turns
            .append_turn_for_question(&question, &turn)
            .await
            .map_err(OrchestratorError::Persistence)?;

        Ok(AdvanceOutcome::Produced {
            stage: stage.name.clone(),
            stage_type: stage.stage_type,
            question_id: question.id,
            turn_id: turn.id,
            used_fallback: false,
            reused: true,
        })
    }

    async fn request_speech(&self, session_id: SessionId, question_id: QuestionId) {
        match self.synthesis.request(session_id, question_id).await {
            Ok(request) => tracing::debug!(?request, "Speech requested"),
            Err(e) => tracing::warn!(error = %e, "Failed to request speech synthesis"),
        }
    }
}

/// `lease:advance:{session}` held by one `advance` call. A call abandoned
/// mid-flight (a lane time limit dropping its future) frees the lease from
/// `Drop`, and only the owning call can ever delete it.
struct SessionLease {
    lock_store: Arc<dyn LockStore>,
    key: String,
    owner: String,
    held: bool,
}

impl SessionLease {
    async fn acquire(
        lock_store: Arc<dyn LockStore>,
        session_id: SessionId,
        ttl: Duration,
    ) -> Result<Option<Self>, LockStoreError> {
        let key = format!("lease:advance:{}", session_id);
        let owner = Uuid::new_v4().to_string();
        if !lock_store.try_acquire(&key, &owner, ttl).await? {
            return Ok(None);
        }
        Ok(Some(Self {
            lock_store,
            key,
            owner,
            held: true,
        }))
    }

    async fn release(mut self) {
        self.held = false;
        release_lease(self.lock_store.as_ref(), &self.key, &self.owner).await;
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        tracing::warn!(lease = %self.key, "Advance abandoned while holding the session lease");
        let lock_store = Arc::clone(&self.lock_store);
        let key = std::mem::take(&mut self.key);
        let owner = std::mem::take(&mut self.owner);
        runtime.spawn(async move {
            release_lease(lock_store.as_ref(), &key, &owner).await;
        });
    }
}

async fn release_lease(lock_store: &dyn LockStore, key: &str, owner: &str) {
    match lock_store.release_owned(key, owner).await {
        Ok(true) => {}
        Ok(false) => tracing::warn!(lease = %key, "Session lease expired before release"),
        Err(e) => tracing::warn!(error = %e, lease = %key, "Failed to release session lease"),
    }
}

/// Successor of `last_answered`, passing over follow-ups that have no
/// answer to follow up on. `None` means the catalog is exhausted.
fn next_stage<'c>(
    catalog: &'c Catalog,
    last_answered: Option<&str>,
    latest_answer: Option<&str>,
) -> Option<&'c StageDefinition> {
    let answer_blank = latest_answer.is_none_or(|a| a.trim().is_empty());
    let mut next = catalog.successor_of(last_answered);
    while let Some(stage) = next {
        if stage.stage_type != StageType::FollowUp || !answer_blank {
            break;
        }
        tracing::info!(
            stage = %stage.name,
            parent = stage.parent.as_deref().unwrap_or_default(),
            "Parent answer is blank, passing over follow-up"
        );
        next = catalog.by_order(stage.order + 1);
    }
    next
}

/// Text of the most recent candidate turn.
fn latest_answer(log: &[TurnLogEntry]) -> Option<&str> {
    log.iter()
        .filter(|e| e.turn.is_candidate())
        .max_by_key(|e| (e.turn.order, e.turn.insertion_id))
        .map(|e| e.turn.text.as_str())
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("repository: {0}")]
    Repository(#[from] RepositoryError),
    #[error("persisting produced stage failed: {0}")]
    Persistence(RepositoryError),
    #[error("lock store: {0}")]
    LockStore(#[from] LockStoreError),
}
