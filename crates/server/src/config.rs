use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use generation::{GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use tracing::warn;
use wizard::LetterFraming;

const CONFIG_FILE: &str = "recap.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub gemini_api_base: String,
    pub gemini_model: String,
    pub generation_timeout_seconds: u64,
    pub session_ttl_seconds: i64,
    pub max_sessions: usize,
    pub letter_language: String,
    pub recap_year: i32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8501".into(),
            gemini_api_base: DEFAULT_API_BASE.into(),
            gemini_model: DEFAULT_MODEL.into(),
            generation_timeout_seconds: 60,
            session_ttl_seconds: 2 * 60 * 60,
            max_sessions: 1024,
            letter_language: "Chinese".into(),
            recap_year: 2025,
        }
    }
}

impl Settings {
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            api_base: self.gemini_api_base.clone(),
            model: self.gemini_model.clone(),
            timeout: Duration::from_secs(self.generation_timeout_seconds.max(1)),
        }
    }

    pub fn framing(&self) -> LetterFraming {
        LetterFraming {
            language: self.letter_language.clone(),
            year: self.recap_year,
        }
    }
}

/// Defaults, then `recap.toml` in the working directory, then `APP__*` variables.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();
    if Path::new(CONFIG_FILE).exists() {
        let raw = fs::read_to_string(CONFIG_FILE)
            .with_context(|| format!("failed to read '{CONFIG_FILE}'"))?;
        apply_file(&mut settings, &raw).with_context(|| format!("invalid '{CONFIG_FILE}'"))?;
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let table: HashMap<String, toml::Value> = toml::from_str(raw)?;
    for (key, value) in table {
        let value = match value {
            toml::Value::String(s) => s,
            other => other.to_string(),
        };
        apply_key(settings, &key, &value);
    }
    Ok(())
}

pub(crate) fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    const KEYS: &[&str] = &[
        "bind_addr",
        "gemini_api_base",
        "gemini_model",
        "generation_timeout_seconds",
        "session_ttl_seconds",
        "max_sessions",
        "letter_language",
        "recap_year",
    ];

    if let Some(v) = lookup("SERVER_BIND") {
        settings.server_bind = v;
    }
    for key in KEYS {
        if let Some(v) = lookup(&format!("APP__{}", key.to_ascii_uppercase())) {
            apply_key(settings, key, &v);
        }
    }
}

fn apply_key(settings: &mut Settings, key: &str, value: &str) {
    let value = value.trim();
    match key {
        "bind_addr" => settings.server_bind = value.to_string(),
        "gemini_api_base" => settings.gemini_api_base = value.to_string(),
        "gemini_model" => settings.gemini_model = value.to_string(),
        "letter_language" => settings.letter_language = value.to_string(),
        "generation_timeout_seconds" => {
            parse_into(key, value, &mut settings.generation_timeout_seconds)
        }
        "session_ttl_seconds" => parse_into(key, value, &mut settings.session_ttl_seconds),
        "max_sessions" => parse_into(key, value, &mut settings.max_sessions),
        "recap_year" => parse_into(key, value, &mut settings.recap_year),
        _ => warn!(%key, "ignoring unknown setting"),
    }
}

fn parse_into<T: std::str::FromStr>(key: &str, value: &str, slot: &mut T) {
    match value.parse() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(%key, %value, "ignoring unparseable setting"),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
