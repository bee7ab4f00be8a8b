use async_trait::async_trait;
use thiserror::Error;

mod gemini;

pub use gemini::{GeminiClient, GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("the provider rejected the credential (HTTP {status})")]
    Unauthorized { status: u16 },
    #[error("provider returned HTTP {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("no reply from the provider within {seconds}s")]
    Timeout { seconds: u64 },
    #[error("transport failure: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("prompt was blocked by the provider: {reason}")]
    Blocked { reason: String },
    #[error("provider returned no text")]
    EmptyResponse,
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("invalid provider endpoint: {0}")]
    InvalidEndpoint(String),
}

/// External text-generation provider that turns a prompt into a letter.
#[async_trait]
pub trait LetterGenerator: Send + Sync {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, GenerationError>;
}
