//! JSON HTTP server.
//!
//! Exposes question answering and document analysis over HTTP. The
//! [`Assistant`] (and the models behind it) is built once and shared
//! read-only by every request; each session owns its own document, chat
//! history, and index cache behind its own lock, so sessions never share
//! per-document state. At most `[server].max_sessions` sessions stay open;
//! opening one more closes the least recently used.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `POST`   | `/ask` | Stateless question about a document sent inline |
//! | `POST`   | `/summarize` | Extractive summary of a text |
//! | `POST`   | `/keywords` | Top keywords of a text |
//! | `POST`   | `/sessions` | Open a session on a document |
//! | `POST`   | `/sessions/{id}/ask` | Ask within a session (cached index) |
//! | `GET`    | `/sessions/{id}/history` | Questions and replies so far |
//! | `DELETE` | `/sessions/{id}` | Close a session |
//!
//! # Error Contract
//!
//! Request errors use one JSON shape:
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404). Pipeline outcomes
//! such as "no answer" are not errors: `/ask` always returns 200 with a
//! tagged `reply`.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted to support browser-based
//! clients.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use docqa_core::analysis::{keyword_scores, summarize, Keyword, DEFAULT_KEYWORDS, DEFAULT_SUMMARY_SENTENCES};
use docqa_core::assistant::{Assistant, Reply};
use docqa_core::session::{Session, Turn};

use crate::config::Config;
use crate::service::{load_assistant, new_session};

type SessionMap = LruCache<Uuid, Arc<Mutex<Session>>>;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    assistant: Arc<Assistant>,
    sessions: Arc<Mutex<SessionMap>>,
    config: Arc<Config>,
}

impl AppState {
    async fn session(&self, id: &str) -> Result<Arc<Mutex<Session>>, AppError> {
        let id = Uuid::parse_str(id).map_err(|_| not_found(format!("no session: {}", id)))?;
        self.sessions
            .lock()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(format!("no session: {}", id)))
    }
}

/// Build the router around an already constructed assistant.
pub fn router(assistant: Arc<Assistant>, config: &Config) -> Router {
    let max_sessions = NonZeroUsize::new(config.server.max_sessions).unwrap_or(NonZeroUsize::MIN);
    let state = AppState {
        assistant,
        sessions: Arc::new(Mutex::new(LruCache::new(max_sessions))),
        config: Arc::new(config.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/ask", post(handle_ask))
        .route("/summarize", post(handle_summarize))
        .route("/keywords", post(handle_keywords))
        .route("/sessions", post(handle_create_session))
        .route("/sessions/{id}", axum::routing::delete(handle_delete_session))
        .route("/sessions/{id}/ask", post(handle_session_ask))
        .route("/sessions/{id}/history", get(handle_session_history))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server.
///
/// Loads the models once, binds to `[server].bind`, and serves until the
/// process is terminated. Returns an error if model loading or binding
/// fails.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let assistant = Arc::new(load_assistant(config).await?);
    let app = router(assistant, config);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    info!(addr = %listener.local_addr()?, "docqa server listening");
    println!("docqa server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

fn require_question(question: &str) -> Result<(), AppError> {
    if question.trim().is_empty() {
        return Err(bad_request("question must not be empty"));
    }
    Ok(())
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    document: String,
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

#[derive(Serialize)]
struct AskResponse {
    message: String,
    reply: Reply,
}

impl From<Reply> for AskResponse {
    fn from(reply: Reply) -> Self {
        Self {
            message: reply.message(),
            reply,
        }
    }
}

/// Stateless question: the document is indexed for this request only.
async fn handle_ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    require_question(&req.question)?;
    let reply = state
        .assistant
        .ask(&req.document, &req.question, req.top_k)
        .await;
    Ok(Json(reply.into()))
}

// ============ POST /summarize, /keywords ============

#[derive(Deserialize)]
struct SummarizeRequest {
    text: String,
    #[serde(default)]
    sentences: Option<usize>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    summary: String,
}

async fn handle_summarize(Json(req): Json<SummarizeRequest>) -> Json<SummarizeResponse> {
    let n = req.sentences.unwrap_or(DEFAULT_SUMMARY_SENTENCES);
    Json(SummarizeResponse {
        summary: summarize(&req.text, n),
    })
}

#[derive(Deserialize)]
struct KeywordsRequest {
    text: String,
    #[serde(default)]
    top: Option<usize>,
}

#[derive(Serialize)]
struct KeywordsResponse {
    keywords: Vec<Keyword>,
}

async fn handle_keywords(Json(req): Json<KeywordsRequest>) -> Json<KeywordsResponse> {
    let n = req.top.unwrap_or(DEFAULT_KEYWORDS);
    Json(KeywordsResponse {
        keywords: keyword_scores(&req.text, n),
    })
}

// ============ Sessions ============

#[derive(Deserialize)]
struct CreateSessionRequest {
    document: String,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    id: String,
    words: usize,
}

async fn handle_create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> (StatusCode, Json<CreateSessionResponse>) {
    let mut session = new_session(&state.config);
    session.load_document(req.name.unwrap_or_else(|| "document".to_string()), req.document);
    let words = session.document().map_or(0, |d| d.word_count());

    let id = Uuid::new_v4();
    let evicted = state
        .sessions
        .lock()
        .await
        .push(id, Arc::new(Mutex::new(session)));
    if let Some((old, _)) = evicted {
        info!(id = %old, "session limit reached, closed least recently used session");
    }
    info!(%id, words, "session opened");

    (
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            id: id.to_string(),
            words,
        }),
    )
}

#[derive(Deserialize)]
struct SessionAskRequest {
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

async fn handle_session_ask(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SessionAskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    require_question(&req.question)?;
    let session = state.session(&id).await?;
    let mut session = session.lock().await;
    let reply = state
        .assistant
        .ask_in_session(&mut session, &req.question, req.top_k)
        .await;
    Ok(Json(reply.into()))
}

#[derive(Serialize)]
struct HistoryResponse {
    turns: Vec<Turn>,
}

async fn handle_session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryResponse>, AppError> {
    let session = state.session(&id).await?;
    let turns = session.lock().await.history().to_vec();
    Ok(Json(HistoryResponse { turns }))
}

async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let uuid = Uuid::parse_str(&id).map_err(|_| not_found(format!("no session: {}", id)))?;
    match state.sessions.lock().await.pop(&uuid) {
        Some(_) => {
            info!(%uuid, "session closed");
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(not_found(format!("no session: {}", id))),
    }
}
