mod environment;
mod settings;

pub use environment::Environment;
pub use settings::{
    DatabaseSettings, DispatchSettings, LlmSettings, LoggingSettings, OrchestratorConfig,
    ReportSettings, RetrievalSettings, ServerSettings, Settings, SpeechSettings, StorageSettings,
    TranscriptionSettings,
};
