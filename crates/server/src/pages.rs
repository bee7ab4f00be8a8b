//! Server-rendered pages. Every handler answers with a redirect back to the
//! session page (post/redirect/get) or a rendered page.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use shared::{
    domain::{LetterOutcome, SessionId, Stage},
    error::{ApiError, ErrorCode},
    protocol::{AnswerRequest, BeginRequest, LetterView, SessionView},
};
use tracing::warn;

use crate::{api, app_state::AppState, status_for};

const STYLE: &str = r#"
body { background-color: #fdfbf7; font-family: 'Garamond', 'Georgia', 'Times New Roman', serif; color: #333333; }
main { max-width: 720px; margin: 0 auto; padding: 2rem 1rem; }
h1, h2, h3 { font-weight: normal; color: #2c2c2c; }
textarea, input[type=password] { width: 100%; background-color: #ffffff; border: 1px solid #e0e0e0;
  font-family: inherit; font-size: 16px; color: #333333; box-sizing: border-box; padding: 0.5rem; }
textarea { height: 150px; }
button { background-color: #f4f1ea; color: #333333; border: 1px solid #dcdcdc; font-family: inherit;
  border-radius: 4px; padding: 0.5rem 1rem; cursor: pointer; }
button:hover { background-color: #e8e5de; border-color: #bbbbbb; }
.actions { display: flex; gap: 0.5rem; margin-top: 1rem; }
.actions form { margin: 0; }
.error { color: #8a2b2b; }
.letter-box { background-color: #ffffff; padding: 40px; border: 1px solid #eaeaea;
  box-shadow: 0 4px 6px rgba(0,0,0,0.02); margin-top: 20px; line-height: 1.8; font-size: 18px; }
"#;

fn escape(text: &str) -> String {
    ammonia::clean_text(text)
}

/// Escapes each line and joins with `<br>` so the letter keeps its layout.
fn letter_html(body: &str) -> String {
    body.lines().map(escape).collect::<Vec<_>>().join("<br>")
}

fn page_url(session_id: SessionId) -> String {
    format!("/sessions/{session_id}")
}

fn layout(year: i32, body: &str, refresh: bool) -> Html<String> {
    let refresh = if refresh {
        r#"<meta http-equiv="refresh" content="2">"#
    } else {
        ""
    };
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
{refresh}
<title>{year} Recap</title>
<style>{STYLE}</style>
</head>
<body><main>
<h1>Recap {year}</h1>
<p>A quiet space to reflect on your year.</p>
{body}
</main></body>
</html>"#
    ))
}

fn button_form(action: &str, label: &str) -> String {
    format!(r#"<form method="post" action="{action}"><button type="submit">{label}</button></form>"#)
}

fn intro_body(session_id: SessionId, view: &SessionView, error: Option<&str>) -> String {
    let url = page_url(session_id);
    let error = error
        .map(|message| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .unwrap_or_default();
    let saved = if view.has_credential {
        button_form(&format!("{url}/resume"), "Continue with saved key")
    } else {
        String::new()
    };
    format!(
        r#"<p>Take a moment to breathe. We will ask you {total} questions to help uncover the story of your year.</p>
<hr>
<p>Please provide your Google Gemini API Key to continue.</p>
{error}
<form method="post" action="{url}/begin">
<label for="credential">Gemini API Key</label>
<input type="password" id="credential" name="credential" autocomplete="off">
<div class="actions"><button type="submit">Begin Reflection</button></div>
</form>
{saved}"#,
        total = view.total,
    )
}

fn question_body(session_id: SessionId, view: &SessionView) -> String {
    let Some(question) = &view.question else {
        return String::new();
    };
    let url = page_url(session_id);
    format!(
        r#"<h3>Question {number}/{total}</h3>
<p>{prompt}</p>
<form method="post" action="{url}/answer">
<input type="hidden" name="question" value="{number}">
<label for="text">Your answer</label>
<textarea id="text" name="text">{answer}</textarea>
<div class="actions">
<button type="submit" name="direction" value="back">Back</button>
<button type="submit" name="direction" value="next">Next</button>
</div>
</form>"#,
        number = question.number,
        total = view.total,
        prompt = escape(&question.prompt),
        answer = escape(&question.answer),
    )
}

fn result_body(session_id: SessionId, view: &SessionView, year: i32) -> String {
    let url = page_url(session_id);
    let letter = match &view.letter {
        Some(LetterView::Pending) => {
            "<p>Gathering your thoughts...</p><p><em>Writing...</em></p>".to_string()
        }
        Some(LetterView::Ready { body, outcome, .. }) => {
            let retry = match outcome {
                LetterOutcome::Failed => button_form(&format!("{url}/letter"), "Try again"),
                LetterOutcome::Generated => String::new(),
            };
            format!(r#"<div class="letter-box">{}</div>{retry}"#, letter_html(body))
        }
        None => button_form(&format!("{url}/letter"), "Write my letter"),
    };
    format!(
        r#"<h2>Your {year} Letter</h2>
{letter}
<hr>
<div class="actions">
{back}
{reset}
</div>"#,
        back = button_form(&format!("{url}/result/back"), "Back"),
        reset = button_form(&format!("{url}/reset"), "Start Over"),
    )
}

pub(crate) fn render(
    state: &AppState,
    session_id: SessionId,
    view: &SessionView,
    error: Option<&str>,
) -> Html<String> {
    let year = state.recap_year;
    match view.stage {
        Stage::Intro => layout(year, &intro_body(session_id, view, error), false),
        Stage::Question => layout(year, &question_body(session_id, view), false),
        Stage::Result => {
            let pending = matches!(view.letter, Some(LetterView::Pending));
            layout(year, &result_body(session_id, view, year), pending)
        }
    }
}

fn error_page(state: &AppState, error: &ApiError) -> Response {
    let hint = match error.code {
        ErrorCode::NotFound => "This reflection has ended or expired.",
        ErrorCode::RateLimited => "Too many reflections are in progress right now.",
        _ => "Something went wrong.",
    };
    let body = format!(
        r#"<p class="error">{hint}</p><p>{}</p><p><a href="/">Start a new reflection</a></p>"#,
        escape(&error.message)
    );
    (
        status_for(error.code),
        layout(state.recap_year, &body, false),
    )
        .into_response()
}

/// Conflicts (stale or double-submitted forms) fall back to showing the
/// current page; anything else is an error page.
fn after_action(
    state: &AppState,
    session_id: SessionId,
    result: Result<SessionView, ApiError>,
) -> Response {
    match result {
        Ok(_) => Redirect::to(&page_url(session_id)).into_response(),
        Err(error) if error.code == ErrorCode::Conflict => {
            warn!(%session_id, %error, "ignoring out-of-date form submission");
            Redirect::to(&page_url(session_id)).into_response()
        }
        Err(error) => error_page(state, &error),
    }
}

pub(crate) async fn start(State(state): State<Arc<AppState>>) -> Response {
    match api::create_session(&state.api).await {
        Ok(created) => Redirect::to(&page_url(created.session_id)).into_response(),
        Err(error) => error_page(&state, &error),
    }
}

pub(crate) async fn show(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Response {
    match api::session_view(&state.api, session_id).await {
        Ok(view) => render(&state, session_id, &view, None).into_response(),
        Err(error) => error_page(&state, &error),
    }
}

pub(crate) async fn begin(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Form(req): Form<BeginRequest>,
) -> Response {
    match api::begin(&state.api, session_id, &req.credential).await {
        Err(error) if error.code == ErrorCode::Validation => {
            match api::session_view(&state.api, session_id).await {
                Ok(view) => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    render(&state, session_id, &view, Some(&error.message)),
                )
                    .into_response(),
                Err(error) => error_page(&state, &error),
            }
        }
        result => after_action(&state, session_id, result),
    }
}

pub(crate) async fn resume(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Response {
    let result = api::resume(&state.api, session_id).await;
    after_action(&state, session_id, result)
}

pub(crate) async fn answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Form(req): Form<AnswerRequest>,
) -> Response {
    let result = api::answer(&state.api, session_id, req).await;
    after_action(&state, session_id, result)
}

pub(crate) async fn result_back(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Response {
    let result = api::result_back(&state.api, session_id).await;
    after_action(&state, session_id, result)
}

pub(crate) async fn letter(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Response {
    let result = api::request_letter(&state.api, session_id).await;
    after_action(&state, session_id, result)
}

pub(crate) async fn reset(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Response {
    let result = api::reset(&state.api, session_id).await;
    after_action(&state, session_id, result)
}
