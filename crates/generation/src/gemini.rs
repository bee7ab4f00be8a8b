use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::{GenerationError, LetterGenerator};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_base: String,
    pub model: String,
    /// Upper bound for a whole `generateContent` round trip.
    pub timeout: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            model: DEFAULT_MODEL.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Google Gemini `generateContent` client. The API key is supplied per call.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    endpoint: Url,
    model: String,
    timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let endpoint = generate_content_url(&config.api_base, &config.model)?;
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(GenerationError::Transport)?;
        Ok(Self {
            http,
            endpoint,
            model: config.model,
            timeout: config.timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn transport_error(&self, error: reqwest::Error) -> GenerationError {
        if error.is_timeout() {
            GenerationError::Timeout {
                seconds: self.timeout.as_secs(),
            }
        } else {
            GenerationError::Transport(error)
        }
    }
}

#[async_trait]
impl LetterGenerator for GeminiClient {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, GenerationError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };
        debug!(model = %self.model, prompt_chars = prompt.chars().count(), "requesting letter");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(API_KEY_HEADER, credential)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let error = classify_failure(status, &body);
            warn!(model = %self.model, status = status.as_u16(), %error, "letter generation rejected");
            return Err(error);
        }
        extract_text(&body)
    }
}

pub(crate) fn generate_content_url(api_base: &str, model: &str) -> Result<Url, GenerationError> {
    let model = model.trim().trim_start_matches("models/");
    if model.is_empty() {
        return Err(GenerationError::InvalidEndpoint("model name is empty".into()));
    }
    let base = api_base.trim().trim_end_matches('/');
    Url::parse(&format!("{base}/models/{model}:generateContent"))
        .map_err(|e| GenerationError::InvalidEndpoint(format!("{base}: {e}")))
}

fn classify_failure(status: StatusCode, body: &str) -> GenerationError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                trimmed.chars().take(200).collect()
            }
        });

    // Gemini reports a bad key as 400 INVALID_ARGUMENT rather than 401.
    let bad_key = message.to_ascii_lowercase().contains("api key not valid");
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN || bad_key {
        return GenerationError::Unauthorized {
            status: status.as_u16(),
        };
    }
    GenerationError::Provider {
        status: status.as_u16(),
        message,
    }
}

fn extract_text(body: &str) -> Result<String, GenerationError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(match parsed.prompt_feedback.and_then(|f| f.block_reason) {
            Some(reason) => GenerationError::Blocked { reason },
            None => GenerationError::EmptyResponse,
        });
    };

    let text: String = candidate
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();

    if text.trim().is_empty() {
        return Err(match candidate.finish_reason {
            Some(reason) if reason != "STOP" => GenerationError::Blocked { reason },
            _ => GenerationError::EmptyResponse,
        });
    }
    Ok(text)
}

#[cfg(test)]
#[path = "tests/gemini_tests.rs"]
mod tests;
