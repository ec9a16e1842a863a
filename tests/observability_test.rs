use interlocutor::infrastructure::observability::{
    REQUEST_ID_HEADER, RequestId, TracingConfig, sanitize_prompt,
};
use interlocutor::presentation::config::{Environment, LoggingSettings};

#[test]
fn given_empty_prompt_when_sanitizing_then_returns_empty_marker() {
    assert_eq!(sanitize_prompt(""), "[EMPTY]");
    assert_eq!(sanitize_prompt("   "), "[EMPTY]");
}

#[test]
fn given_short_prompt_when_sanitizing_then_returns_unchanged() {
    let prompt = "Ask about the candidate's strongest skill.";
    assert_eq!(sanitize_prompt(prompt), prompt);
}

#[test]
fn given_long_prompt_when_sanitizing_then_truncates_with_length() {
    let prompt = "a".repeat(150);
    let result = sanitize_prompt(&prompt);
    assert!(result.contains("... (150 chars total)"));
    assert!(result.starts_with(&"a".repeat(100)));
}

#[test]
fn given_multibyte_prompt_when_truncating_then_cuts_on_char_boundary() {
    let prompt = "résumé ".repeat(30);
    let result = sanitize_prompt(&prompt);
    assert!(result.contains("chars total)"));
}

#[test]
fn given_bearer_token_when_sanitizing_then_redacts_token() {
    let result = sanitize_prompt("Authorization: Bearer abc123xyz");
    assert!(result.contains("Bearer [REDACTED]"));
    assert!(!result.contains("abc123xyz"));
}

#[test]
fn given_repeated_secrets_when_sanitizing_then_redacts_every_occurrence() {
    let result = sanitize_prompt("api_key=one&password=two and api_key=three");
    assert!(!result.contains("one"));
    assert!(!result.contains("two"));
    assert!(!result.contains("three"));
    assert_eq!(result.matches("[REDACTED]").count(), 3);
}

#[test]
fn given_request_id_header_constant_when_accessed_then_returns_correct_value() {
    assert_eq!(REQUEST_ID_HEADER, "x-request-id");
}

#[test]
fn given_request_id_when_cloned_then_equals_original() {
    let original = RequestId("abc".to_string());
    let cloned = original.clone();
    assert_eq!(original.0, cloned.0);
}

#[test]
fn given_logging_settings_when_building_tracing_config_then_uses_level_and_environment() {
    let logging = LoggingSettings {
        level: "warn".to_string(),
        enable_json: true,
    };

    let config = TracingConfig::from_settings(Environment::Prod, &logging);

    assert_eq!(config.environment, "prod");
    assert!(config.json_format);
    assert!(config.default_directive.starts_with("warn,"));
}

#[test]
fn given_default_config_when_created_then_environment_is_set() {
    let config = TracingConfig::default();
    assert!(!config.environment.is_empty());
}
