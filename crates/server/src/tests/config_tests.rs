use super::{apply_env, apply_file, Settings};

use std::{collections::HashMap, time::Duration};

#[test]
fn defaults_target_gemini_and_local_bind() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8501");
    assert_eq!(settings.gemini_model, "gemini-3-flash-preview");
    assert_eq!(settings.gemini().timeout, Duration::from_secs(60));
    assert_eq!(settings.framing().language, "Chinese");
    assert_eq!(settings.framing().year, 2025);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    apply_file(
        &mut settings,
        r#"
bind_addr = "0.0.0.0:9000"
gemini_model = "gemini-2.0-flash"
generation_timeout_seconds = 15
max_sessions = 10
letter_language = "English"
"#,
    )
    .expect("parse");

    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.gemini_model, "gemini-2.0-flash");
    assert_eq!(settings.generation_timeout_seconds, 15);
    assert_eq!(settings.max_sessions, 10);
    assert_eq!(settings.letter_language, "English");
}

#[test]
fn malformed_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(apply_file(&mut settings, "bind_addr = ").is_err());
}

#[test]
fn env_overrides_file_and_ignores_bad_numbers() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("SERVER_BIND", "127.0.0.1:1"),
        ("APP__BIND_ADDR", "127.0.0.1:2"),
        ("APP__RECAP_YEAR", "2026"),
        ("APP__SESSION_TTL_SECONDS", "soon"),
    ]);
    let mut settings = Settings::default();
    apply_file(&mut settings, "recap_year = 2024").expect("parse");
    apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string()));

    assert_eq!(settings.server_bind, "127.0.0.1:2");
    assert_eq!(settings.recap_year, 2026);
    assert_eq!(
        settings.session_ttl_seconds,
        Settings::default().session_ttl_seconds
    );
}

#[test]
fn zero_timeout_is_raised_to_one_second() {
    let settings = Settings {
        generation_timeout_seconds: 0,
        ..Settings::default()
    };
    assert_eq!(settings.gemini().timeout, Duration::from_secs(1));
}
