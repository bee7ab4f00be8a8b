use super::*;

fn answers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(q, a)| (q.to_string(), a.to_string()))
        .collect()
}

#[test]
fn answers_follow_question_order_not_insertion_order() {
    let questions = QuestionSet::new(["Q1", "Q2"]).expect("set");
    let formatted = format_answers(&questions, &answers(&[("Q2", "b"), ("Q1", "a")]));
    assert_eq!(formatted, "Q1\nAnswer: a\nQ2\nAnswer: b");
}

#[test]
fn unanswered_prompts_appear_with_empty_answer() {
    let questions = QuestionSet::new(["Q1", "Q2", "Q3"]).expect("set");
    let formatted = format_answers(&questions, &answers(&[("Q2", "only this")]));
    assert_eq!(
        formatted,
        "Q1\nAnswer: \nQ2\nAnswer: only this\nQ3\nAnswer: "
    );
}

#[test]
fn every_builtin_prompt_appears_exactly_once() {
    let questions = QuestionSet::recap_2025();
    let formatted = format_answers(&questions, &HashMap::new());
    for prompt in questions.iter() {
        assert_eq!(formatted.matches(prompt).count(), 1, "prompt: {prompt}");
    }
}

#[test]
fn framing_carries_language_year_and_payload() {
    let framing = LetterFraming {
        language: "French".into(),
        year: 2031,
    };
    let prompt = build_letter_prompt(&framing, "Q1\nAnswer: a");
    assert!(prompt.contains("reflecting on their year 2031"));
    assert!(prompt.contains("- Be written in French."));
    assert!(prompt.contains("translate them into French"));
    assert!(prompt.contains("Not use emojis"));
    assert!(prompt.contains("Sincerely, Your 2031 Self"));
    assert!(prompt.ends_with("Here are the user's answers:\nQ1\nAnswer: a\n"));
}

#[test]
fn failure_message_embeds_cause() {
    let message = failure_message(&GenerationError::Unauthorized { status: 401 });
    assert!(message.starts_with("An error occurred while connecting to the essence of your year: "));
    assert!(message.contains("HTTP 401"));
}
