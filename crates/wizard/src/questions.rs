use std::{collections::HashSet, sync::Arc};

use crate::WizardError;

const RECAP_2025: &[&str] = &[
    // Life
    "What was the single most memorable event of 2025 for you?",
    "Which relationship (friend, family, or partner) evolved the most this year?",
    "What is a new habit you formed that you are proud of?",
    "What was the most difficult challenge you faced in your personal life?",
    "What's the best thing you've ever bought this year?",
    "What makes you feel super excited?",
    // Study / Work
    "What was the most significant thing you learned this year?",
    "Did you achieve the academic or professional goals you set for yourself?",
    "What is a subject or topic you discovered a new passion for?",
    "Describe a moment where you felt completely in your element while working or studying.",
    // Texture of the year
    "If you could describe 2025 with a single color (other than white), what would it be and why?",
    "Where did you spend the most time this year? (e.g., A specific library corner, a cafe, your desk, a park)",
    "What song or album will always remind you of this year?",
    "What was the 'flavor' of this year? (e.g., bitter, sweet, spicy, bland)",
    "Which book or movie resonated with you the most?",
    // Big picture
    "How has your worldview changed compared to the beginning of the year?",
    "Who would you like to thank the most this year?",
    "What is something you let go of in 2025?",
    "What are you most grateful for right now?",
    "If you could send a message to yourself from January 1st, 2025, what would it be?",
    "What is the greatest achievement this year?",
    "Do you hate someone you didn't hate at this time last year?",
    // Future
    "What is your primary word or theme for 2026?",
    "What is one specific fear you want to conquer next year?",
    "Who do you want to spend more time with in the future?",
    "Where do you see yourself exactly one year from today?",
];

/// Ordered, immutable list of prompts. Cloning shares the underlying list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionSet {
    prompts: Arc<[String]>,
}

impl QuestionSet {
    /// Answers are keyed by prompt text, so prompts must be non-blank and unique.
    pub fn new<I, S>(prompts: I) -> Result<Self, WizardError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prompts: Vec<String> = prompts.into_iter().map(Into::into).collect();
        let mut seen = HashSet::with_capacity(prompts.len());
        for (index, prompt) in prompts.iter().enumerate() {
            if prompt.trim().is_empty() {
                return Err(WizardError::InvalidQuestionSet(format!(
                    "question {} is blank",
                    index + 1
                )));
            }
            if !seen.insert(prompt.as_str()) {
                return Err(WizardError::InvalidQuestionSet(format!(
                    "question {} duplicates an earlier prompt",
                    index + 1
                )));
            }
        }
        Ok(Self {
            prompts: prompts.into(),
        })
    }

    /// The built-in 26 reflective prompts about the year 2025.
    pub fn recap_2025() -> Self {
        Self {
            prompts: RECAP_2025.iter().map(|prompt| prompt.to_string()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Prompt for a 1-based question number.
    pub fn get(&self, number: usize) -> Option<&str> {
        number
            .checked_sub(1)
            .and_then(|index| self.prompts.get(index))
            .map(String::as_str)
    }

    pub fn contains(&self, prompt: &str) -> bool {
        self.prompts.iter().any(|p| p == prompt)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.prompts.iter().map(String::as_str)
    }
}

impl Default for QuestionSet {
    fn default() -> Self {
        Self::recap_2025()
    }
}

#[cfg(test)]
#[path = "tests/questions_tests.rs"]
mod tests;
