mod context_retriever;
mod llm_client;
mod lock_store;
mod media_store;
mod report_sink;
mod repository_error;
mod session_repository;
mod speech_synthesizer;
mod task_dispatcher;
mod transcription_engine;
mod turn_repository;

pub use context_retriever::{
    ContextRetriever, ContextRetrieverError, RetrievalQuery, RetrievedContext,
};
pub use llm_client::{LlmClient, LlmClientError, Prompt};
pub use lock_store::{LockStore, LockStoreError};
pub use media_store::{MediaStore, MediaStoreError};
pub use report_sink::{ReportExchange, ReportSink, ReportSinkError, TranscriptReport};
pub use repository_error::RepositoryError;
pub use session_repository::SessionRepository;
pub use speech_synthesizer::{SpeechError, SpeechSynthesizer};
pub use task_dispatcher::{DispatchError, TaskDispatcher};
pub use transcription_engine::{TranscriptionEngine, TranscriptionError};
pub use turn_repository::TurnRepository;
