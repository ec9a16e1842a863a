use crate::presentation::config::{Environment, LoggingSettings};

/// Subscriber options resolved from settings and the process environment.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub environment: String,
    pub json_format: bool,
    pub default_directive: String,
}

impl TracingConfig {
    /// `LOG_FORMAT=json` forces JSON output regardless of settings.
    pub fn from_settings(environment: Environment, logging: &LoggingSettings) -> Self {
        let json_from_env = std::env::var("LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        Self {
            environment: environment.to_string(),
            json_format: logging.enable_json || json_from_env,
            default_directive: format!(
                "{},interlocutor=debug,tower_http=debug",
                logging.level
            ),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            environment: std::env::var("APP_ENV").unwrap_or_else(|_| "local".to_string()),
            json_format: std::env::var("LOG_FORMAT")
                .map(|v| v.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
            default_directive: "info,interlocutor=debug,tower_http=debug".to_string(),
        }
    }
}
