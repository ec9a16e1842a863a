use std::time::Duration;

use interlocutor::presentation::config::{Environment, Settings};

#[test]
fn given_no_configuration_when_defaulting_then_runs_in_memory_with_local_media() {
    let settings = Settings::default();

    assert!(settings.database.url.is_none());
    assert_eq!(settings.storage.media_dir.as_deref(), Some("./data/media"));
    assert_eq!(settings.server.port, 3000);
    assert_eq!(settings.speech.audio_format, "mp3");
}

#[test]
fn given_default_orchestrator_settings_when_reading_durations_then_match_millis() {
    let settings = Settings::default();

    assert_eq!(settings.orchestrator.race_grace(), Duration::from_secs(3));
    assert_eq!(settings.orchestrator.session_lease_ttl(), Duration::from_secs(120));
    assert_eq!(settings.orchestrator.finalize_dedup(), Duration::from_secs(3600));
    assert_eq!(settings.dispatch.task_time_limit(), Duration::from_secs(120));
    assert!(settings.dispatch.light_concurrency > settings.dispatch.heavy_concurrency);
}

#[test]
fn given_environment_names_when_parsing_then_accepts_known_values() {
    assert_eq!(Environment::try_from("LOCAL".to_string()), Ok(Environment::Local));
    assert_eq!(Environment::try_from("production".to_string()), Ok(Environment::Prod));
    assert!(Environment::try_from("staging".to_string()).is_err());
    assert!(Environment::Local.is_local());
}

#[test]
fn given_default_timings_when_validating_then_lease_covers_task_limit() {
    let settings = Settings::default().validated().unwrap();

    assert!(settings.orchestrator.session_lease_ttl() >= settings.dispatch.task_time_limit());
}

#[test]
fn given_lease_shorter_than_task_limit_when_validating_then_rejects_settings() {
    let mut settings = Settings::default();
    settings.orchestrator.session_lease_ttl_ms = 30_000;
    settings.dispatch.task_time_limit_ms = 120_000;

    let err = settings.validated().unwrap_err();

    assert!(err.to_string().contains("session_lease_ttl_ms"));
}
