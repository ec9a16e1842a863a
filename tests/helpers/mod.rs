#![allow(dead_code)]

pub mod test_postgres;

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use serde_json::json;

use interlocutor::application::ports::{
    DispatchError, LlmClient, LlmClientError, Prompt, ReportSink, ReportSinkError,
    SessionRepository, SpeechError, SpeechSynthesizer, TaskDispatcher, TranscriptReport,
    TranscriptionEngine, TranscriptionError, TurnRepository,
};
use interlocutor::application::services::{
    CompletionDetector, Finalizer, Orchestrator, OrchestratorSettings, SessionService,
    StageProducer, SynthesisService, task_routes,
};
use interlocutor::domain::scenarios::{builtin_registry, transition_catalog};
use interlocutor::domain::{
    CandidateId, Catalog, CatalogId, CatalogRegistry, Lane, NewSession, NewTurn,
    ProducedQuestion, Session, StageDefinition, Task, TaskKind, Turn,
};
use interlocutor::infrastructure::persistence::{InMemoryLockStore, InMemoryRepository};
use interlocutor::infrastructure::retrieval::InMemoryContextRetriever;
use interlocutor::infrastructure::storage::ObjectMediaStore;

pub const GENERATION_TIMEOUT: Duration = Duration::from_millis(500);

/// LLM that replays queued replies, then falls back to a fixed one.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String, LlmClientError>>>,
    default_reply: String,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    pub fn new(default_reply: &str) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            default_reply: default_reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
    }

    pub fn push_failure(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(LlmClientError::ApiRequestFailed("HTTP 500".to_string())));
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &Prompt) -> Result<String, LlmClientError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(self.default_reply.clone()))
    }
}

pub struct SlowLlm(pub Duration);

#[async_trait::async_trait]
impl LlmClient for SlowLlm {
    async fn complete(&self, _prompt: &Prompt) -> Result<String, LlmClientError> {
        tokio::time::sleep(self.0).await;
        Ok("Too late to matter?".to_string())
    }
}

#[derive(Default)]
pub struct FakeSynthesizer {
    calls: AtomicUsize,
}

impl FakeSynthesizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    fn format(&self) -> &str {
        "mp3"
    }

    async fn synthesize(&self, text: &str) -> Result<Bytes, SpeechError> {
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from(format!("ID3{}", text)))
    }
}

pub struct FakeTranscriber(pub String);

#[async_trait::async_trait]
impl TranscriptionEngine for FakeTranscriber {
    async fn transcribe(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        if audio_data.is_empty() {
            return Err(TranscriptionError::UnsupportedFormat("empty".to_string()));
        }
        Ok(self.0.clone())
    }
}

/// Records dispatched tasks instead of running them.
#[derive(Default)]
pub struct RecordingDispatcher {
    tasks: Mutex<Vec<(Lane, Task)>>,
}

impl RecordingDispatcher {
    pub fn tasks(&self) -> Vec<(Lane, Task)> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn count(&self, kind: TaskKind) -> usize {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, task)| task.kind() == kind)
            .count()
    }
}

#[async_trait::async_trait]
impl TaskDispatcher for RecordingDispatcher {
    async fn dispatch(&self, task: Task) -> Result<Lane, DispatchError> {
        let lane = task_routes::lane_for(task.kind());
        self.tasks.lock().unwrap().push((lane, task));
        Ok(lane)
    }
}

#[derive(Default)]
pub struct RecordingReportSink {
    reports: Mutex<Vec<TranscriptReport>>,
}

impl RecordingReportSink {
    pub fn reports(&self) -> Vec<TranscriptReport> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReportSink for RecordingReportSink {
    async fn submit(
        &self,
        _session_id: interlocutor::domain::SessionId,
        report: &TranscriptReport,
    ) -> Result<(), ReportSinkError> {
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }
}

/// Catalog from the orchestration walkthrough: two templates, one generated
/// stage and its follow-up.
pub fn skill_catalog() -> Catalog {
    Catalog::new(
        CatalogId::Standard,
        "test",
        vec![
            StageDefinition::template("intro", 1, "Hello {candidate_name}, please introduce yourself."),
            StageDefinition::template("motivation", 2, "Why {target_role}?"),
            StageDefinition::generated(
                "skill",
                3,
                "{target_role} skills",
                "Ask about the candidate's strongest skill for {target_role}.",
            )
            .with_category("technical"),
            StageDefinition::follow_up(
                "skill_followup",
                4,
                "skill",
                "Dig deeper into the skill the candidate just described.",
            )
            .with_category("technical"),
        ],
    )
    .unwrap()
}

pub fn skill_registry() -> CatalogRegistry {
    CatalogRegistry::new(skill_catalog(), transition_catalog().unwrap()).unwrap()
}

pub fn new_session_attrs(prior_field: &str, target_role: &str) -> NewSession {
    NewSession {
        candidate_id: CandidateId::new(),
        candidate_name: "Dana".to_string(),
        prior_field: prior_field.to_string(),
        target_role: target_role.to_string(),
        organization: Some("Acme".to_string()),
        resume_id: None,
    }
}

/// The whole application core over in-memory adapters.
pub struct Harness {
    pub repo: InMemoryRepository,
    pub locks: Arc<InMemoryLockStore>,
    pub media: Arc<ObjectMediaStore>,
    pub llm: Arc<ScriptedLlm>,
    pub retriever: Arc<InMemoryContextRetriever>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub report_sink: Arc<RecordingReportSink>,
    pub catalogs: CatalogRegistry,
    pub producer: Arc<StageProducer>,
    pub synthesis: Arc<SynthesisService>,
    pub orchestrator: Arc<Orchestrator>,
    pub finalizer: Arc<Finalizer>,
    pub sessions: Arc<SessionService>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(builtin_registry().unwrap(), OrchestratorSettings::default())
    }

    pub fn with_skill_catalog() -> Self {
        Self::build(skill_registry(), OrchestratorSettings::default())
    }

    pub fn build(catalogs: CatalogRegistry, settings: OrchestratorSettings) -> Self {
        let llm = Arc::new(ScriptedLlm::new("What is the hardest bug you have fixed?"));
        Self::assemble(catalogs, settings, llm.clone(), llm)
    }

    /// Like [`Harness::build`], but stages are generated by `model`.
    pub fn with_model(
        catalogs: CatalogRegistry,
        settings: OrchestratorSettings,
        model: Arc<dyn LlmClient>,
    ) -> Self {
        let llm = Arc::new(ScriptedLlm::new("unused"));
        Self::assemble(catalogs, settings, llm, model)
    }

    fn assemble(
        catalogs: CatalogRegistry,
        settings: OrchestratorSettings,
        llm: Arc<ScriptedLlm>,
        model: Arc<dyn LlmClient>,
    ) -> Self {
        let repo = InMemoryRepository::new();
        let locks = Arc::new(InMemoryLockStore::new());
        let media = Arc::new(ObjectMediaStore::in_memory());
        let retriever = Arc::new(InMemoryContextRetriever::new());
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let synthesizer = Arc::new(FakeSynthesizer::default());
        let report_sink = Arc::new(RecordingReportSink::default());

        let session_repo: Arc<dyn SessionRepository> = Arc::new(repo.clone());
        let turn_repo: Arc<dyn TurnRepository> = Arc::new(repo.clone());

        let producer = Arc::new(StageProducer::new(
            model,
            retriever.clone(),
            GENERATION_TIMEOUT,
            3,
        ));
        let synthesis = Arc::new(SynthesisService::new(
            Arc::clone(&turn_repo),
            synthesizer.clone(),
            media.clone(),
            locks.clone(),
            dispatcher.clone(),
            Duration::from_secs(60),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            catalogs.clone(),
            Arc::clone(&session_repo),
            Arc::clone(&turn_repo),
            locks.clone(),
            Arc::clone(&producer),
            Arc::clone(&synthesis),
            CompletionDetector::new(Arc::clone(&session_repo), dispatcher.clone()),
            settings,
        ));
        let finalizer = Arc::new(Finalizer::new(
            catalogs.clone(),
            Arc::clone(&session_repo),
            Arc::clone(&turn_repo),
            locks.clone(),
            report_sink.clone(),
            Duration::from_secs(3600),
        ));
        let sessions = Arc::new(SessionService::new(
            catalogs.clone(),
            session_repo,
            turn_repo,
            Arc::clone(&producer),
            Arc::clone(&synthesis),
            dispatcher.clone(),
            media.clone(),
            Arc::new(FakeTranscriber(
                "I moved our deploys to blue green releases.".to_string(),
            )),
        ));

        Self {
            repo,
            locks,
            media,
            llm,
            retriever,
            dispatcher,
            synthesizer,
            report_sink,
            catalogs,
            producer,
            synthesis,
            orchestrator,
            finalizer,
            sessions,
        }
    }

    /// A live session bound to the standard catalog, with no turns yet.
    pub async fn live_session(&self) -> Session {
        let session = Session::new(
            new_session_attrs("Computer Science", "Backend Engineer"),
            CatalogId::Standard,
        );
        self.repo.create(&session).await.unwrap();
        self.repo
            .mark_live(session.id, chrono::Utc::now())
            .await
            .unwrap();
        self.repo.get_by_id(session.id).await.unwrap().unwrap()
    }

    /// Appends an AI turn asking `stage`, backdated past the race window.
    pub async fn ask(&self, session: &Session, stage: &str) -> ProducedQuestion {
        let question = ProducedQuestion::new(
            session.id,
            stage.to_string(),
            format!("Question for {}", stage),
            None,
            json!({}),
        );
        let mut turn = NewTurn::ai(session.id, question.id, question.content.clone());
        turn.created_at = chrono::Utc::now() - chrono::Duration::seconds(30);
        self.repo
            .append_question_turn(&question, &turn)
            .await
            .unwrap();
        question
    }

    /// Appends a candidate turn answering the latest AI question.
    pub async fn answer(&self, session: &Session, text: &str) -> Turn {
        let answered = self
            .repo
            .latest_ai_turn(session.id)
            .await
            .unwrap()
            .and_then(|t| t.question_id);
        self.repo
            .append_turn(&NewTurn::candidate(session.id, answered, text.to_string()))
            .await
            .unwrap()
    }

    pub async fn stage_names(&self, session: &Session) -> Vec<String> {
        self.repo
            .list_questions(session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.stage)
            .collect()
    }
}
