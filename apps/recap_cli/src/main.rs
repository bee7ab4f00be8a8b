use std::{io::Write as _, time::Duration};

use anyhow::Result;
use clap::Parser;
use generation::{GeminiClient, GeminiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};
use shared::domain::{LetterOutcome, Stage};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;
use tracing_subscriber::EnvFilter;
use wizard::{LetterFraming, QuestionSet, SessionState};

#[derive(Parser, Debug)]
#[command(name = "recap", about = "Reflect on your year and receive a letter")]
struct Args {
    /// Gemini API key; asked for interactively when absent.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, default_value = DEFAULT_MODEL)]
    model: String,
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,
    #[arg(long, default_value = "Chinese")]
    language: String,
    #[arg(long, default_value_t = 2025)]
    year: i32,
    #[arg(long, default_value_t = 60)]
    timeout_seconds: u64,
}

#[derive(Debug, PartialEq, Eq)]
enum QuestionInput {
    Answer(String),
    Keep,
    Back,
    Reset,
    Quit,
}

fn parse_question_input(line: &str) -> QuestionInput {
    match line.trim() {
        "" => QuestionInput::Keep,
        ":back" => QuestionInput::Back,
        ":reset" => QuestionInput::Reset,
        ":quit" => QuestionInput::Quit,
        _ => QuestionInput::Answer(line.trim_end().to_string()),
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ResultChoice {
    Back,
    Retry,
    StartOver,
    Quit,
    Unknown,
}

fn parse_result_choice(line: &str) -> ResultChoice {
    match line.trim().to_ascii_lowercase().as_str() {
        "b" | "back" => ResultChoice::Back,
        "r" | "retry" => ResultChoice::Retry,
        "s" | "start over" | "reset" => ResultChoice::StartOver,
        "q" | "quit" => ResultChoice::Quit,
        _ => ResultChoice::Unknown,
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>, label: &str) -> Result<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;
    Ok(lines.next_line().await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let client = GeminiClient::new(GeminiConfig {
        api_base: args.api_base,
        model: args.model,
        timeout: Duration::from_secs(args.timeout_seconds.max(1)),
    })?;
    let framing = LetterFraming {
        language: args.language,
        year: args.year,
    };
    let mut session = SessionState::new(QuestionSet::recap_2025(), framing);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("Recap {}", args.year);
    println!("A quiet space to reflect on your year.");
    println!(
        "Take a moment to breathe. We will ask you {} questions to help uncover the story of your year.",
        session.total()
    );
    println!("Type :back to return to the previous question, :reset to start over, :quit to leave.");

    if let Some(key) = args.api_key.as_deref() {
        if let Err(error) = session.begin(key) {
            println!("{error}");
        }
    }

    loop {
        match session.stage() {
            Stage::Intro => {
                if session.has_credential() {
                    session.resume()?;
                    continue;
                }
                let Some(line) = read_line(&mut lines, "Gemini API Key: ").await? else {
                    break;
                };
                if line.trim() == ":quit" {
                    break;
                }
                if let Err(error) = session.begin(&line) {
                    println!("{error}");
                }
            }
            Stage::Question => {
                let Some((number, prompt)) = session.current_question() else {
                    break;
                };
                let prompt = prompt.to_string();
                let existing = session.current_answer().unwrap_or_default().to_string();
                println!("\nQuestion {number}/{}", session.total());
                println!("{prompt}");
                if !existing.is_empty() {
                    println!("(current answer: {existing}; press Enter to keep it)");
                }

                let Some(line) = read_line(&mut lines, "> ").await? else {
                    break;
                };
                let outcome = match parse_question_input(&line) {
                    QuestionInput::Quit => break,
                    QuestionInput::Reset => {
                        session.reset();
                        Ok(())
                    }
                    QuestionInput::Back => session.answer_and_retreat(number, existing),
                    QuestionInput::Keep => session.answer_and_advance(number, existing),
                    QuestionInput::Answer(text) => session.answer_and_advance(number, text),
                };
                if let Err(error) = outcome {
                    warn!(%error, "navigation refused");
                }
            }
            Stage::Result => {
                if session.letter().ready().is_none() {
                    println!("\nYour {} Letter", args.year);
                    println!("Gathering your thoughts... Writing...");
                    let letter = session.compose_letter(&client).await?;
                    if letter.outcome == LetterOutcome::Failed {
                        println!("(the letter could not be written; you may retry)");
                    }
                    println!("\n{}\n", letter.body);
                    continue;
                }

                let Some(line) = read_line(&mut lines, "[b]ack  [r]etry  [s]tart over  [q]uit: ").await?
                else {
                    break;
                };
                let outcome = match parse_result_choice(&line) {
                    ResultChoice::Quit => break,
                    ResultChoice::Back => session.revisit_last_question(),
                    ResultChoice::Retry => session.compose_letter(&client).await.map(|letter| {
                        println!("\n{}\n", letter.body);
                    }),
                    ResultChoice::StartOver => {
                        session.reset();
                        Ok(())
                    }
                    ResultChoice::Unknown => Ok(()),
                };
                if let Err(error) = outcome {
                    println!("{error}");
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_commands_are_recognised() {
        assert_eq!(parse_question_input("  "), QuestionInput::Keep);
        assert_eq!(parse_question_input(":back\n"), QuestionInput::Back);
        assert_eq!(parse_question_input(":reset"), QuestionInput::Reset);
        assert_eq!(parse_question_input(":quit"), QuestionInput::Quit);
        assert_eq!(
            parse_question_input("  a quiet cafe  "),
            QuestionInput::Answer("  a quiet cafe".into())
        );
    }

    #[test]
    fn result_choices_accept_letters_and_words() {
        assert_eq!(parse_result_choice("B"), ResultChoice::Back);
        assert_eq!(parse_result_choice("retry"), ResultChoice::Retry);
        assert_eq!(parse_result_choice("s"), ResultChoice::StartOver);
        assert_eq!(parse_result_choice("q"), ResultChoice::Quit);
        assert_eq!(parse_result_choice("x"), ResultChoice::Unknown);
    }

    #[test]
    fn api_key_is_optional() {
        let args = Args::try_parse_from(["recap", "--year", "2026"]).expect("args");
        assert_eq!(args.year, 2026);
        assert_eq!(args.model, DEFAULT_MODEL);
    }
}
