use super::*;

use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::Duration;
use generation::GenerationError;
use shared::{domain::LetterOutcome, error::ErrorCode, protocol::LetterView};
use tokio::sync::Notify;
use wizard::{LetterFraming, QuestionSet};

use crate::sessions::{SessionLimits, SessionStore};

struct ScriptedGenerator {
    reply: Result<&'static str, u16>,
    release: Option<Arc<Notify>>,
}

#[async_trait]
impl LetterGenerator for ScriptedGenerator {
    async fn generate(&self, credential: &str, prompt: &str) -> Result<String, GenerationError> {
        if let Some(release) = &self.release {
            release.notified().await;
        }
        match self.reply {
            Ok(text) => Ok(format!("{text} ({credential}, {} chars)", prompt.len())),
            Err(status) => Err(GenerationError::Unauthorized { status }),
        }
    }
}

fn context(generator: ScriptedGenerator) -> ApiContext {
    ApiContext {
        sessions: SessionStore::new(
            QuestionSet::new(["Q1", "Q2"]).expect("set"),
            LetterFraming::default(),
            SessionLimits {
                max_sessions: 16,
                idle_ttl: Duration::minutes(5),
            },
        ),
        generator: Arc::new(generator),
    }
}

fn answer_req(question: usize, text: &str, direction: Direction) -> AnswerRequest {
    AnswerRequest {
        question,
        text: text.to_string(),
        direction,
    }
}

async fn wait_for_letter(ctx: &ApiContext, id: SessionId) -> LetterView {
    for _ in 0..100 {
        let view = session_view(ctx, id).await.expect("view");
        if let Some(letter @ LetterView::Ready { .. }) = view.letter {
            return letter;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
    panic!("letter never became ready");
}

async fn walk_to_last_question(ctx: &ApiContext) -> SessionId {
    let created = create_session(ctx).await.expect("create");
    let id = created.session_id;
    begin(ctx, id, "key").await.expect("begin");
    answer(ctx, id, answer_req(1, "a", Direction::Next))
        .await
        .expect("q1");
    id
}

#[tokio::test]
async fn empty_credential_is_a_validation_error() {
    let ctx = context(ScriptedGenerator {
        reply: Ok("letter"),
        release: None,
    });
    let created = create_session(&ctx).await.expect("create");
    assert_eq!(created.view.stage, Stage::Intro);

    let err = begin(&ctx, created.session_id, "")
        .await
        .expect_err("empty key");
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(err.message, "Please enter a valid API Key.");
    let view = session_view(&ctx, created.session_id).await.expect("view");
    assert_eq!(view.step, 0);
}

#[tokio::test]
async fn finishing_questions_starts_letter_generation() {
    let ctx = context(ScriptedGenerator {
        reply: Ok("Dear you"),
        release: None,
    });
    let id = walk_to_last_question(&ctx).await;

    let view = answer(&ctx, id, answer_req(2, "b", Direction::Next))
        .await
        .expect("q2");
    assert_eq!(view.stage, Stage::Result);
    assert_eq!(view.step, 3);
    assert_eq!(view.letter, Some(LetterView::Pending));

    let LetterView::Ready { body, outcome, .. } = wait_for_letter(&ctx, id).await else {
        unreachable!();
    };
    assert_eq!(outcome, LetterOutcome::Generated);
    assert!(body.starts_with("Dear you (key, "));
}

#[tokio::test]
async fn provider_failure_is_shown_and_retry_is_possible() {
    let ctx = context(ScriptedGenerator {
        reply: Err(401),
        release: None,
    });
    let id = walk_to_last_question(&ctx).await;
    answer(&ctx, id, answer_req(2, "b", Direction::Next))
        .await
        .expect("q2");

    let LetterView::Ready { body, outcome, .. } = wait_for_letter(&ctx, id).await else {
        unreachable!();
    };
    assert_eq!(outcome, LetterOutcome::Failed);
    assert!(body.contains("essence of your year"));

    let view = request_letter(&ctx, id).await.expect("retry accepted");
    assert_eq!(view.letter, Some(LetterView::Pending));
    wait_for_letter(&ctx, id).await;
}

#[tokio::test]
async fn navigation_is_refused_while_letter_is_pending() {
    let release = Arc::new(Notify::new());
    let ctx = context(ScriptedGenerator {
        reply: Ok("late letter"),
        release: Some(release.clone()),
    });
    let id = walk_to_last_question(&ctx).await;
    answer(&ctx, id, answer_req(2, "b", Direction::Next))
        .await
        .expect("q2");

    let err = result_back(&ctx, id).await.expect_err("pending");
    assert_eq!(err.code, ErrorCode::Conflict);
    let err = request_letter(&ctx, id).await.expect_err("pending");
    assert_eq!(err.code, ErrorCode::Conflict);

    release.notify_one();
    wait_for_letter(&ctx, id).await;
    let view = result_back(&ctx, id).await.expect("back");
    assert_eq!(view.step, 2);
    assert_eq!(view.question.expect("question").answer, "b");
}

#[tokio::test]
async fn reset_during_generation_discards_the_late_letter() {
    let release = Arc::new(Notify::new());
    let ctx = context(ScriptedGenerator {
        reply: Ok("late letter"),
        release: Some(release.clone()),
    });
    let id = walk_to_last_question(&ctx).await;
    answer(&ctx, id, answer_req(2, "b", Direction::Next))
        .await
        .expect("q2");

    let view = reset(&ctx, id).await.expect("reset");
    assert_eq!(view.step, 0);
    assert!(view.has_credential);

    release.notify_one();
    tokio::time::sleep(StdDuration::from_millis(50)).await;
    let view = session_view(&ctx, id).await.expect("view");
    assert_eq!(view.stage, Stage::Intro);
    assert_eq!(view.letter, None);
}

#[tokio::test]
async fn stale_answer_is_a_conflict() {
    let ctx = context(ScriptedGenerator {
        reply: Ok("letter"),
        release: None,
    });
    let id = walk_to_last_question(&ctx).await;
    let err = answer(&ctx, id, answer_req(1, "again", Direction::Next))
        .await
        .expect_err("stale");
    assert_eq!(err.code, ErrorCode::Conflict);
}

#[tokio::test]
async fn ended_session_is_not_found() {
    let ctx = context(ScriptedGenerator {
        reply: Ok("letter"),
        release: None,
    });
    let created = create_session(&ctx).await.expect("create");
    end_session(&ctx, created.session_id).await.expect("end");
    let err = session_view(&ctx, created.session_id)
        .await
        .expect_err("gone");
    assert_eq!(err.code, ErrorCode::NotFound);
}
