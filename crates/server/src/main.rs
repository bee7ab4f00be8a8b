use std::{net::SocketAddr, sync::Arc, time::Duration as StdDuration};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::Duration;
use generation::GeminiClient;
use shared::{
    domain::SessionId,
    error::{ApiError, ErrorCode},
    protocol::{AnswerRequest, BeginRequest, SessionCreated, SessionView},
};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wizard::QuestionSet;

mod api;
mod app_state;
mod config;
mod pages;
mod sessions;

use api::ApiContext;
use app_state::AppState;
use config::load_settings;
use sessions::{SessionLimits, SessionStore};

const MAX_BODY_BYTES: usize = 64 * 1024;
const SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(60);

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let generator = GeminiClient::new(settings.gemini())?;
    info!(model = generator.model(), endpoint = %generator.endpoint(), "letter provider configured");

    let questions = QuestionSet::recap_2025();
    let sessions = SessionStore::new(
        questions,
        settings.framing(),
        SessionLimits {
            max_sessions: settings.max_sessions,
            idle_ttl: Duration::seconds(settings.session_ttl_seconds),
        },
    );
    let _sweeper = sessions.spawn_sweeper(SWEEP_INTERVAL);

    let state = AppState {
        api: ApiContext {
            sessions,
            generator: Arc::new(generator),
        },
        recap_year: settings.recap_year,
    };
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down");
        })
        .await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/", get(pages::start))
        .route("/sessions/:session_id", get(pages::show))
        .route("/sessions/:session_id/begin", post(pages::begin))
        .route("/sessions/:session_id/resume", post(pages::resume))
        .route("/sessions/:session_id/answer", post(pages::answer))
        .route("/sessions/:session_id/result/back", post(pages::result_back))
        .route("/sessions/:session_id/letter", post(pages::letter))
        .route("/sessions/:session_id/reset", post(pages::reset))
        .route("/api/sessions", post(http_create_session))
        .route(
            "/api/sessions/:session_id",
            get(http_session_view).delete(http_end_session),
        )
        .route("/api/sessions/:session_id/begin", post(http_begin))
        .route("/api/sessions/:session_id/resume", post(http_resume))
        .route("/api/sessions/:session_id/answer", post(http_answer))
        .route("/api/sessions/:session_id/result/back", post(http_result_back))
        .route("/api/sessions/:session_id/letter", post(http_request_letter))
        .route("/api/sessions/:session_id/reset", post(http_reset))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

pub(crate) fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(error: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(error.code), Json(error))
}

async fn healthz() -> &'static str {
    "ok"
}

async fn http_create_session(State(state): State<Arc<AppState>>) -> ApiResult<SessionCreated> {
    api::create_session(&state.api).await.map(Json).map_err(failure)
}

async fn http_session_view(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    api::session_view(&state.api, session_id)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_end_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    api::end_session(&state.api, session_id)
        .await
        .map_err(failure)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn http_begin(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<BeginRequest>,
) -> ApiResult<SessionView> {
    api::begin(&state.api, session_id, &req.credential)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_resume(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    api::resume(&state.api, session_id)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_answer(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
    Json(req): Json<AnswerRequest>,
) -> ApiResult<SessionView> {
    api::answer(&state.api, session_id, req)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_result_back(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    api::result_back(&state.api, session_id)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_request_letter(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    api::request_letter(&state.api, session_id)
        .await
        .map(Json)
        .map_err(failure)
}

async fn http_reset(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<SessionId>,
) -> ApiResult<SessionView> {
    api::reset(&state.api, session_id)
        .await
        .map(Json)
        .map_err(failure)
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
