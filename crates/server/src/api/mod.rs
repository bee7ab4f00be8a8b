use std::sync::Arc;

use generation::LetterGenerator;
use shared::{
    domain::{Direction, SessionId, Stage},
    error::ApiError,
    protocol::{AnswerRequest, SessionCreated, SessionView},
};
use tracing::{debug, info, warn};
use wizard::{LetterRequest, SessionState, WizardError};

use crate::sessions::SessionStore;

#[derive(Clone)]
pub struct ApiContext {
    pub sessions: SessionStore,
    pub generator: Arc<dyn LetterGenerator>,
}

pub async fn create_session(ctx: &ApiContext) -> Result<SessionCreated, ApiError> {
    let session_id = ctx.sessions.create().await?;
    let view = session_view(ctx, session_id).await?;
    info!(%session_id, "session created");
    Ok(SessionCreated { session_id, view })
}

pub async fn session_view(ctx: &ApiContext, session_id: SessionId) -> Result<SessionView, ApiError> {
    ctx.sessions.with_session(session_id, |s| s.view()).await
}

pub async fn begin(
    ctx: &ApiContext,
    session_id: SessionId,
    credential: &str,
) -> Result<SessionView, ApiError> {
    mutate(ctx, session_id, |s| s.begin(credential)).await
}

pub async fn resume(ctx: &ApiContext, session_id: SessionId) -> Result<SessionView, ApiError> {
    mutate(ctx, session_id, SessionState::resume).await
}

/// Saves the answer and moves; reaching the result step starts the letter.
pub async fn answer(
    ctx: &ApiContext,
    session_id: SessionId,
    req: AnswerRequest,
) -> Result<SessionView, ApiError> {
    let (view, request) = ctx
        .sessions
        .with_session(session_id, |s| {
            match req.direction {
                Direction::Next => s.answer_and_advance(req.question, req.text)?,
                Direction::Back => s.answer_and_retreat(req.question, req.text)?,
            }
            let request = match s.stage() {
                Stage::Result => Some(s.start_letter()?),
                _ => None,
            };
            Ok::<_, WizardError>((s.view(), request))
        })
        .await??;
    debug!(%session_id, step = view.step, "answer saved");

    if let Some(request) = request {
        spawn_letter(ctx, session_id, request);
    }
    Ok(view)
}

pub async fn result_back(ctx: &ApiContext, session_id: SessionId) -> Result<SessionView, ApiError> {
    mutate(ctx, session_id, SessionState::revisit_last_question).await
}

/// Starts (or retries) the letter for a session at the result step.
pub async fn request_letter(
    ctx: &ApiContext,
    session_id: SessionId,
) -> Result<SessionView, ApiError> {
    let (view, request) = ctx
        .sessions
        .with_session(session_id, |s| {
            let request = s.start_letter()?;
            Ok::<_, WizardError>((s.view(), request))
        })
        .await??;
    spawn_letter(ctx, session_id, request);
    Ok(view)
}

pub async fn reset(ctx: &ApiContext, session_id: SessionId) -> Result<SessionView, ApiError> {
    ctx.sessions
        .with_session(session_id, |s| {
            s.reset();
            s.view()
        })
        .await
}

pub async fn end_session(ctx: &ApiContext, session_id: SessionId) -> Result<(), ApiError> {
    if ctx.sessions.remove(session_id).await {
        info!(%session_id, "session ended");
    }
    Ok(())
}

async fn mutate(
    ctx: &ApiContext,
    session_id: SessionId,
    f: impl FnOnce(&mut SessionState) -> Result<(), WizardError>,
) -> Result<SessionView, ApiError> {
    ctx.sessions
        .with_session(session_id, |s| {
            f(s)?;
            Ok::<_, WizardError>(s.view())
        })
        .await?
        .map_err(ApiError::from)
}

/// The provider call runs on its own task; the session stays unlocked meanwhile.
fn spawn_letter(ctx: &ApiContext, session_id: SessionId, request: LetterRequest) {
    let sessions = ctx.sessions.clone();
    let generator = ctx.generator.clone();
    tokio::spawn(async move {
        let outcome = generator
            .generate(request.credential.expose(), &request.prompt)
            .await;
        let epoch = request.epoch();
        match sessions
            .with_session(session_id, |s| s.finish_letter(epoch, outcome))
            .await
        {
            Ok(true) => info!(%session_id, "letter ready"),
            Ok(false) => debug!(%session_id, "letter outcome discarded"),
            Err(error) => warn!(%session_id, %error, "session gone before letter finished"),
        }
    });
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
