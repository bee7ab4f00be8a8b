use std::collections::HashMap;

use chrono::{DateTime, Utc};
use generation::{GenerationError, LetterGenerator};
use shared::{
    domain::{LetterOutcome, Stage},
    protocol::{LetterView, QuestionView, SessionView},
};
use tracing::{debug, warn};

use crate::{
    prompt::{build_letter_prompt, failure_message, format_answers},
    Credential, LetterFraming, QuestionSet, WizardError,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub body: String,
    pub outcome: LetterOutcome,
    pub generated_at: DateTime<Utc>,
}

impl Letter {
    fn from_outcome(outcome: Result<String, GenerationError>) -> Self {
        let (body, outcome) = match outcome {
            Ok(text) => (text, LetterOutcome::Generated),
            Err(error) => (failure_message(&error), LetterOutcome::Failed),
        };
        Self {
            body,
            outcome,
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LetterState {
    #[default]
    Absent,
    Pending,
    Ready(Letter),
}

impl LetterState {
    pub fn is_pending(&self) -> bool {
        matches!(self, LetterState::Pending)
    }

    pub fn ready(&self) -> Option<&Letter> {
        match self {
            LetterState::Ready(letter) => Some(letter),
            _ => None,
        }
    }
}

/// Everything the provider call needs, detached from the session so the
/// call can run without holding the session.
#[derive(Debug, Clone)]
pub struct LetterRequest {
    epoch: u64,
    pub credential: Credential,
    pub prompt: String,
}

impl LetterRequest {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// State of one walkthrough.
///
/// `step` is 0 at the intro, `1..=N` while answering question `step`, and
/// `N + 1` once every question has been passed.
#[derive(Debug, Clone)]
pub struct SessionState {
    questions: QuestionSet,
    framing: LetterFraming,
    step: usize,
    answers: HashMap<String, String>,
    credential: Option<Credential>,
    letter: LetterState,
    epoch: u64,
}

impl SessionState {
    pub fn new(questions: QuestionSet, framing: LetterFraming) -> Self {
        Self {
            questions,
            framing,
            step: 0,
            answers: HashMap::new(),
            credential: None,
            letter: LetterState::Absent,
            epoch: 0,
        }
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn step(&self) -> usize {
        self.step
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn stage(&self) -> Stage {
        match self.step {
            0 => Stage::Intro,
            step if step <= self.total() => Stage::Question,
            _ => Stage::Result,
        }
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn letter(&self) -> &LetterState {
        &self.letter
    }

    /// The current question number and prompt, if a question is showing.
    pub fn current_question(&self) -> Option<(usize, &str)> {
        match self.stage() {
            Stage::Question => self.questions.get(self.step).map(|p| (self.step, p)),
            _ => None,
        }
    }

    pub fn current_answer(&self) -> Option<&str> {
        let (_, prompt) = self.current_question()?;
        Some(self.answers.get(prompt).map(String::as_str).unwrap_or_default())
    }

    pub fn begin(&mut self, credential: &str) -> Result<(), WizardError> {
        self.ensure_stage("begin", Stage::Intro)?;
        let credential = Credential::parse(credential)?;
        self.credential = Some(credential);
        self.step = 1;
        debug!(total = self.total(), "walkthrough started");
        Ok(())
    }

    /// Starts again with the credential kept from before a reset.
    pub fn resume(&mut self) -> Result<(), WizardError> {
        self.ensure_stage("resume", Stage::Intro)?;
        if self.credential.is_none() {
            return Err(WizardError::MissingCredential);
        }
        self.step = 1;
        Ok(())
    }

    pub fn answer_and_advance(
        &mut self,
        question: usize,
        text: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.record_answer(question, text.into())?;
        self.step += 1;
        if self.stage() == Stage::Result {
            self.clear_letter();
        }
        Ok(())
    }

    /// Saves the answer and steps back; from question 1 this returns to the intro.
    pub fn answer_and_retreat(
        &mut self,
        question: usize,
        text: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.record_answer(question, text.into())?;
        self.step -= 1;
        Ok(())
    }

    /// Back from the result view to the last question.
    pub fn revisit_last_question(&mut self) -> Result<(), WizardError> {
        self.ensure_stage("go back", Stage::Result)?;
        self.ensure_idle()?;
        self.clear_letter();
        self.step = self.total();
        Ok(())
    }

    /// Clears answers and any letter and returns to the intro. Allowed while a
    /// letter is pending; the late result is discarded. The credential is kept.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.clear_letter();
        self.step = 0;
        debug!("walkthrough reset");
    }

    /// Payload of the letter request: prompts and answers in question order.
    pub fn answers_payload(&self) -> String {
        format_answers(&self.questions, &self.answers)
    }

    /// Marks the letter pending and hands out what the provider call needs.
    pub fn start_letter(&mut self) -> Result<LetterRequest, WizardError> {
        self.ensure_stage("write the letter", Stage::Result)?;
        self.ensure_idle()?;
        let credential = self
            .credential
            .clone()
            .ok_or(WizardError::MissingCredential)?;
        let prompt = build_letter_prompt(&self.framing, &self.answers_payload());

        self.epoch += 1;
        self.letter = LetterState::Pending;
        Ok(LetterRequest {
            epoch: self.epoch,
            credential,
            prompt,
        })
    }

    /// Stores the outcome of a request started by [`Self::start_letter`].
    /// Returns false when the session moved on and the outcome was dropped.
    pub fn finish_letter(&mut self, epoch: u64, outcome: Result<String, GenerationError>) -> bool {
        if epoch != self.epoch || !self.letter.is_pending() {
            debug!(epoch, current = self.epoch, "discarding stale letter");
            return false;
        }
        if let Err(error) = &outcome {
            warn!(%error, "letter generation failed");
        }
        self.letter = LetterState::Ready(Letter::from_outcome(outcome));
        true
    }

    /// Requests the letter and waits for it. Provider failures become the
    /// letter text; only calls outside the result step are errors.
    pub async fn compose_letter(
        &mut self,
        generator: &dyn LetterGenerator,
    ) -> Result<Letter, WizardError> {
        let request = self.start_letter()?;
        let outcome = generator
            .generate(request.credential.expose(), &request.prompt)
            .await;
        self.finish_letter(request.epoch, outcome);
        self.letter
            .ready()
            .cloned()
            .ok_or(WizardError::GenerationPending)
    }

    pub fn view(&self) -> SessionView {
        let question = self.current_question().map(|(number, prompt)| QuestionView {
            number,
            prompt: prompt.to_string(),
            answer: self.answers.get(prompt).cloned().unwrap_or_default(),
        });
        let letter = match &self.letter {
            LetterState::Absent => None,
            LetterState::Pending => Some(LetterView::Pending),
            LetterState::Ready(letter) => Some(LetterView::Ready {
                body: letter.body.clone(),
                outcome: letter.outcome,
                generated_at: letter.generated_at,
            }),
        };
        SessionView {
            stage: self.stage(),
            step: self.step,
            total: self.total(),
            question,
            letter,
            has_credential: self.has_credential(),
        }
    }

    fn record_answer(&mut self, question: usize, text: String) -> Result<(), WizardError> {
        self.ensure_stage("answer", Stage::Question)?;
        if question != self.step {
            return Err(WizardError::StaleQuestion {
                submitted: question,
                current: self.step,
            });
        }
        let Some(prompt) = self.questions.get(question) else {
            return Err(WizardError::InvalidTransition {
                action: "answer",
                step: self.step,
            });
        };
        self.answers.insert(prompt.to_string(), text);
        Ok(())
    }

    fn ensure_stage(&self, action: &'static str, expected: Stage) -> Result<(), WizardError> {
        if self.stage() != expected {
            return Err(WizardError::InvalidTransition {
                action,
                step: self.step,
            });
        }
        Ok(())
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.letter.is_pending() {
            return Err(WizardError::GenerationPending);
        }
        Ok(())
    }

    fn clear_letter(&mut self) {
        self.epoch += 1;
        self.letter = LetterState::Absent;
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
