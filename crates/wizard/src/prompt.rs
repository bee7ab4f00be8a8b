//! Prompt assembly for the letter request. Everything here is pure so the
//! wording can be checked without a provider.

use std::collections::HashMap;

use generation::GenerationError;

use crate::QuestionSet;

const FAILURE_PREFIX: &str = "An error occurred while connecting to the essence of your year";

/// Parameters of the fixed instructional framing around the answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LetterFraming {
    /// Language the letter is written in; answers in other languages are translated.
    pub language: String,
    pub year: i32,
}

impl Default for LetterFraming {
    fn default() -> Self {
        Self {
            language: "Chinese".into(),
            year: 2025,
        }
    }
}

/// Every prompt in set order, each followed by its answer (empty when unanswered).
pub fn format_answers(questions: &QuestionSet, answers: &HashMap<String, String>) -> String {
    questions
        .iter()
        .map(|prompt| {
            let answer = answers.get(prompt).map(String::as_str).unwrap_or_default();
            format!("{prompt}\nAnswer: {answer}")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_letter_prompt(framing: &LetterFraming, formatted_answers: &str) -> String {
    let LetterFraming { language, year } = framing;
    format!(
        "You are a thoughtful, empathetic writer. Based on the following answers from a user \
reflecting on their year {year}, write a cohesive, warm, and humanistic summary letter addressed \
to them. If any answers are not written in {language}, translate them into {language}.

The letter should:
- Be written in {language}.
- Have a calm, reflective, and literary tone.
- Not use emojis.
- Synthesize the answers into a narrative flow rather than listing them.
- Reflect on their life, studies, the 'texture' of their year, and their future hopes.
- Be formatted beautifully as a letter (Dear [Name]..., Sincerely, Your {year} Self).

Here are the user's answers:
{formatted_answers}
"
    )
}

/// Text shown in place of the letter when the provider call fails.
pub fn failure_message(error: &GenerationError) -> String {
    format!("{FAILURE_PREFIX}: {error}")
}

#[cfg(test)]
#[path = "tests/prompt_tests.rs"]
mod tests;
