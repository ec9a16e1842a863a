use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use interlocutor::application::ports::{
    ContextRetriever, LockStore, ReportSink, SessionRepository, TaskDispatcher, TurnRepository,
};
use interlocutor::application::services::{
    CompletionDetector, Finalizer, LaneWorker, Orchestrator, OrchestratorSettings,
    SessionService, StageProducer, SynthesisService, TaskRouter,
};
use interlocutor::domain::Lane;
use interlocutor::domain::scenarios::builtin_registry;
use interlocutor::infrastructure::audio::OpenAiWhisperEngine;
use interlocutor::infrastructure::llm::create_chat_client;
use interlocutor::infrastructure::observability::{TracingConfig, init_tracing};
use interlocutor::infrastructure::persistence::{
    InMemoryLockStore, InMemoryRepository, PgLockStore, PgSessionRepository, PgTurnRepository,
    create_pool, run_migrations,
};
use interlocutor::infrastructure::queue::ChannelDispatcher;
use interlocutor::infrastructure::report::{HttpReportSink, LoggingReportSink};
use interlocutor::infrastructure::retrieval::{HttpContextRetriever, InMemoryContextRetriever};
use interlocutor::infrastructure::speech::OpenAiSpeechSynthesizer;
use interlocutor::infrastructure::storage::ObjectMediaStore;
use interlocutor::presentation::config::DatabaseSettings;
use interlocutor::presentation::{AppState, Environment, Settings, create_router};

struct Stores {
    sessions: Arc<dyn SessionRepository>,
    turns: Arc<dyn TurnRepository>,
    locks: Arc<dyn LockStore>,
}

async fn build_stores(settings: &DatabaseSettings) -> anyhow::Result<Stores> {
    let Some(url) = settings.url.as_deref() else {
        tracing::warn!("No database url configured, using in-memory session storage");
        let repository = InMemoryRepository::new();
        return Ok(Stores {
            sessions: Arc::new(repository.clone()),
            turns: Arc::new(repository),
            locks: Arc::new(InMemoryLockStore::new()),
        });
    };

    let pool = create_pool(url, settings.max_connections)
        .await
        .context("connecting to PostgreSQL")?;
    if settings.run_migrations {
        run_migrations(&pool).await.context("running migrations")?;
    }

    Ok(Stores {
        sessions: Arc::new(PgSessionRepository::new(pool.clone())),
        turns: Arc::new(PgTurnRepository::new(pool.clone())),
        locks: Arc::new(PgLockStore::new(pool)),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("loading settings")?;

    init_tracing(&TracingConfig::from_settings(environment, &settings.logging));

    let catalogs = builtin_registry().context("building stage catalogs")?;
    let stores = build_stores(&settings.database).await?;

    let media_store = Arc::new(
        ObjectMediaStore::from_settings(settings.storage.media_dir.as_deref())
            .context("opening media store")?,
    );
    let llm_client =
        Arc::new(create_chat_client(&settings.llm).context("configuring LLM client")?);
    let retriever: Arc<dyn ContextRetriever> = match settings.retrieval.url.as_deref() {
        Some(url) => Arc::new(HttpContextRetriever::new(url)),
        None => Arc::new(InMemoryContextRetriever::new()),
    };
    let report_sink: Arc<dyn ReportSink> = match settings.report.url.as_deref() {
        Some(url) => Arc::new(HttpReportSink::new(url)),
        None => Arc::new(LoggingReportSink),
    };

    let (dispatcher, receivers) = ChannelDispatcher::new(settings.dispatch.queue_capacity);
    let dispatcher: Arc<dyn TaskDispatcher> = Arc::new(dispatcher);
    let timing = &settings.orchestrator;

    let producer = Arc::new(StageProducer::new(
        llm_client,
        retriever,
        timing.generation_timeout(),
        settings.retrieval.top_k,
    ));
    let synthesis = Arc::new(SynthesisService::new(
        Arc::clone(&stores.turns),
        Arc::new(OpenAiSpeechSynthesizer::new(&settings.speech)),
        media_store.clone(),
        Arc::clone(&stores.locks),
        Arc::clone(&dispatcher),
        timing.synthesis_lock_ttl(),
    ));
    let orchestrator = Arc::new(Orchestrator::new(
        catalogs.clone(),
        Arc::clone(&stores.sessions),
        Arc::clone(&stores.turns),
        Arc::clone(&stores.locks),
        Arc::clone(&producer),
        Arc::clone(&synthesis),
        CompletionDetector::new(Arc::clone(&stores.sessions), Arc::clone(&dispatcher)),
        OrchestratorSettings {
            race_grace: timing.race_grace(),
            session_lease_ttl: timing.session_lease_ttl(),
        },
    ));
    let finalizer = Arc::new(Finalizer::new(
        catalogs.clone(),
        Arc::clone(&stores.sessions),
        Arc::clone(&stores.turns),
        Arc::clone(&stores.locks),
        report_sink,
        timing.finalize_dedup(),
    ));
    let session_service = Arc::new(SessionService::new(
        catalogs,
        Arc::clone(&stores.sessions),
        Arc::clone(&stores.turns),
        producer,
        Arc::clone(&synthesis),
        Arc::clone(&dispatcher),
        media_store,
        Arc::new(OpenAiWhisperEngine::new(&settings.transcription)),
    ));

    let router = Arc::new(TaskRouter::new(
        Arc::clone(&orchestrator),
        synthesis,
        finalizer,
        Arc::clone(&session_service),
    ));
    let dispatch = &settings.dispatch;
    tokio::spawn(
        LaneWorker::new(
            Lane::Light,
            receivers.light,
            router.clone(),
            dispatch.light_concurrency,
            dispatch.task_time_limit(),
        )
        .run(),
    );
    tokio::spawn(
        LaneWorker::new(
            Lane::Heavy,
            receivers.heavy,
            router,
            dispatch.heavy_concurrency,
            dispatch.task_time_limit(),
        )
        .run(),
    );

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("parsing server address")?;

    let app = create_router(AppState {
        session_service,
        orchestrator,
        settings: settings.clone(),
    });

    tracing::info!(%addr, environment = %environment, "Listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
