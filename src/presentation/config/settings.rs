use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use super::Environment;

/// Full service configuration. Every field has a default, so a missing
/// `appsettings.{env}.toml` still yields a runnable local setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub llm: LlmSettings,
    pub speech: SpeechSettings,
    pub transcription: TranscriptionSettings,
    pub retrieval: RetrievalSettings,
    pub storage: StorageSettings,
    pub report: ReportSettings,
    pub orchestrator: OrchestratorConfig,
    pub dispatch: DispatchSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Layers `appsettings.{env}.toml` under `APP_`-prefixed environment
    /// variables (`APP_LLM__API_KEY` sets `llm.api_key`).
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                File::with_name(&format!("appsettings.{}", environment.as_str()))
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// A session lease must outlive the task that takes it, or a second
    /// advance could start while the first is still within its time limit.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.orchestrator.session_lease_ttl_ms < self.dispatch.task_time_limit_ms {
            return Err(ConfigError::Message(format!(
                "orchestrator.session_lease_ttl_ms ({}) must be at least dispatch.task_time_limit_ms ({})",
                self.orchestrator.session_lease_ttl_ms, self.dispatch.task_time_limit_ms
            )));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// Without a url the service runs on in-memory repositories and locks.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            run_migrations: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub provider: String,
    pub base_url: Option<String>,
    pub azure_endpoint: Option<String>,
    pub api_key: String,
    pub chat_model: String,
    pub max_tokens: usize,
    pub temperature: f32,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            base_url: None,
            azure_endpoint: None,
            api_key: String::new(),
            chat_model: "gpt-4o-mini".to_string(),
            max_tokens: 256,
            temperature: 0.4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechSettings {
    pub base_url: Option<String>,
    pub api_key: String,
    pub model: String,
    pub voice: String,
    pub audio_format: String,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: String::new(),
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            audio_format: "mp3".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    pub base_url: Option<String>,
    pub api_key: String,
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Résumé search service. Unset means generation runs without context.
    pub url: Option<String>,
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { url: None, top_k: 4 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Local media directory. Unset keeps media in memory.
    pub media_dir: Option<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            media_dir: Some("./data/media".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub race_grace_ms: u64,
    pub session_lease_ttl_ms: u64,
    pub synthesis_lock_ttl_ms: u64,
    pub finalize_dedup_ms: u64,
    pub generation_timeout_ms: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            race_grace_ms: 3_000,
            session_lease_ttl_ms: 120_000,
            synthesis_lock_ttl_ms: 60_000,
            finalize_dedup_ms: 3_600_000,
            generation_timeout_ms: 20_000,
        }
    }
}

impl OrchestratorConfig {
    pub fn race_grace(&self) -> Duration {
        Duration::from_millis(self.race_grace_ms)
    }

    pub fn session_lease_ttl(&self) -> Duration {
        Duration::from_millis(self.session_lease_ttl_ms)
    }

    pub fn synthesis_lock_ttl(&self) -> Duration {
        Duration::from_millis(self.synthesis_lock_ttl_ms)
    }

    pub fn finalize_dedup(&self) -> Duration {
        Duration::from_millis(self.finalize_dedup_ms)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_millis(self.generation_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub queue_capacity: usize,
    pub light_concurrency: usize,
    pub heavy_concurrency: usize,
    pub task_time_limit_ms: u64,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            light_concurrency: 8,
            heavy_concurrency: 2,
            task_time_limit_ms: 120_000,
        }
    }
}

impl DispatchSettings {
    pub fn task_time_limit(&self) -> Duration {
        Duration::from_millis(self.task_time_limit_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            enable_json: false,
        }
    }
}
