//! HTTP API server for integration with other systems.
//!
//! Serves one shared session. Requests are handled one at a time, in the
//! order they acquire the session lock.

use crate::chunking::Chunk;
use crate::cli::Output;
use crate::config::Settings;
use crate::document::Upload;
use crate::error::PagewiseError;
use crate::session::{Message, ProcessResult, Session, SessionState};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

/// Shared application state.
struct AppState {
    session: Mutex<Session>,
}

/// Run the HTTP API server.
pub async fn run_serve(
    host: &str,
    port: u16,
    api_key: Option<String>,
    settings: Settings,
) -> anyhow::Result<()> {
    let mut session = Session::from_settings(&settings)?;
    if let Some(key) = api_key {
        session.set_credentials(&key)?;
        info!("Credentials configured from the environment");
    }

    let state = Arc::new(AppState {
        session: Mutex::new(session),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/session", get(session_info))
        .route("/credentials", post(set_credentials))
        .route("/document", post(upload_document))
        .route("/ask", post(ask))
        .route("/history", get(history).delete(clear_history))
        .layer(cors)
        .with_state(state);

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Pagewise API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Health", "GET    /health");
    Output::kv("Session", "GET    /session");
    Output::kv("Credentials", "POST   /credentials");
    Output::kv("Document", "POST   /document?name=<file name>");
    Output::kv("Ask", "POST   /ask");
    Output::kv("History", "GET    /history");
    Output::kv("Clear History", "DELETE /history");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct CredentialsRequest {
    api_key: String,
}

#[derive(Deserialize)]
struct DocumentQuery {
    name: String,
}

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
    sources: Vec<Chunk>,
}

#[derive(Serialize)]
struct SessionInfo {
    state: SessionState,
    credentials_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    index_id: Option<Uuid>,
    chunks: usize,
    history_len: usize,
}

impl SessionInfo {
    fn of(session: &Session) -> Self {
        let index = session.index();
        Self {
            state: session.state(),
            credentials_configured: session.credentials_configured(),
            document: index.map(|i| i.document().to_string()),
            index_id: index.map(|i| i.id()),
            chunks: index.map(|i| i.len()).unwrap_or(0),
            history_len: session.history().len(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// A library error rendered as a JSON response.
struct ApiError(PagewiseError);

impl From<PagewiseError> for ApiError {
    fn from(error: PagewiseError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

fn status_for(error: &PagewiseError) -> StatusCode {
    match error {
        PagewiseError::Guard(_) => StatusCode::CONFLICT,
        PagewiseError::Auth(_) => StatusCode::UNAUTHORIZED,
        PagewiseError::Extraction(_)
        | PagewiseError::EmptyDocument(_)
        | PagewiseError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PagewiseError::ContextTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        PagewiseError::Generation(_)
        | PagewiseError::IndexBuild(_)
        | PagewiseError::Retrieval(_)
        | PagewiseError::Embedding(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// === Handlers ===

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn session_info(State(state): State<Arc<AppState>>) -> Json<SessionInfo> {
    let session = state.session.lock().await;
    Json(SessionInfo::of(&session))
}

async fn set_credentials(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<SessionInfo>, ApiError> {
    let mut session = state.session.lock().await;
    session.set_credentials(&req.api_key)?;
    Ok(Json(SessionInfo::of(&session)))
}

async fn upload_document(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DocumentQuery>,
    body: Bytes,
) -> Result<Json<ProcessResult>, ApiError> {
    let upload = Upload::new(query.name, body.to_vec());
    let mut session = state.session.lock().await;
    let result = session.process_document(upload).await?;
    Ok(Json(result))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let mut session = state.session.lock().await;
    let answer = session.ask_question(&req.question).await?.collect().await?;
    Ok(Json(AskResponse {
        answer: answer.text,
        sources: answer.sources,
    }))
}

async fn history(State(state): State<Arc<AppState>>) -> Json<Vec<Message>> {
    let session = state.session.lock().await;
    Json(session.history().to_vec())
}

async fn clear_history(State(state): State<Arc<AppState>>) -> StatusCode {
    state.session.lock().await.clear_history();
    StatusCode::NO_CONTENT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (PagewiseError::Guard("no document".into()), StatusCode::CONFLICT),
            (PagewiseError::Auth("bad key".into()), StatusCode::UNAUTHORIZED),
            (
                PagewiseError::EmptyDocument("scan.pdf".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                PagewiseError::ContextTooLarge { size: 10, limit: 5 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (PagewiseError::Generation("reset".into()), StatusCode::BAD_GATEWAY),
            (
                PagewiseError::Config("bad".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, status) in cases {
            assert_eq!(status_for(&error), status, "{}", error);
        }
    }

    #[test]
    fn test_session_info_before_credentials() {
        let session = Session::from_settings(&Settings::default()).unwrap();
        let info = serde_json::to_value(SessionInfo::of(&session)).unwrap();
        assert_eq!(info["state"], "uninitialized");
        assert_eq!(info["credentials_configured"], false);
        assert!(info.get("document").is_none());
    }
}
