use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Direction, LetterOutcome, SessionId, Stage};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeginRequest {
    #[serde(default)]
    pub credential: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRequest {
    /// 1-based number of the question the answer was written for.
    pub question: usize,
    #[serde(default)]
    pub text: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    pub session_id: SessionId,
    pub view: SessionView,
}

/// Everything a presentation layer needs to render the current step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    pub stage: Stage,
    pub step: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub letter: Option<LetterView>,
    pub has_credential: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionView {
    pub number: usize,
    pub prompt: String,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LetterView {
    Pending,
    Ready {
        body: String,
        outcome: LetterOutcome,
        generated_at: DateTime<Utc>,
    },
}
