use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Please enter a valid API Key.")]
    EmptyCredential,
    #[error("no API key has been saved for this session")]
    MissingCredential,
    #[error("answer was written for question {submitted} but the session is at step {current}")]
    StaleQuestion { submitted: usize, current: usize },
    #[error("cannot {action} at step {step}")]
    InvalidTransition { action: &'static str, step: usize },
    #[error("a letter is already being written for this session")]
    GenerationPending,
    #[error("invalid question set: {0}")]
    InvalidQuestionSet(String),
}

impl From<WizardError> for ApiError {
    fn from(value: WizardError) -> Self {
        let code = match value {
            WizardError::EmptyCredential | WizardError::MissingCredential => ErrorCode::Validation,
            WizardError::StaleQuestion { .. }
            | WizardError::InvalidTransition { .. }
            | WizardError::GenerationPending => ErrorCode::Conflict,
            WizardError::InvalidQuestionSet(_) => ErrorCode::Internal,
        };
        ApiError::new(code, value.to_string())
    }
}
