//! HTTP surface for the chat service.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::conversation::{AnswerSource, Turn};
use crate::error::ChorusError;
use crate::service::ChatService;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Missing is treated like empty and rejected by the service.
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<Turn>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub source: AnswerSource,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn router(service: Arc<ChatService>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/health", get(health))
        .with_state(service)
}

/// Bind `address` and serve until the process is stopped.
pub async fn serve(address: &str, service: Arc<ChatService>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(address).await?;
    info!(bind_address = %listener.local_addr()?, "chat endpoint started");
    axum::serve(listener, router(service)).await
}

pub async fn chat(
    State(service): State<Arc<ChatService>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    match service.get_response(&request.message, &request.history).await {
        Ok(answer) => {
            let source = answer.source().clone();
            Ok(Json(ChatResponse {
                response: answer.into_text(),
                source,
            }))
        }
        Err(e) => Err(error_reply(&e)),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

fn error_reply(err: &ChorusError) -> (StatusCode, Json<ErrorResponse>) {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        error!(error = %err, "chat request failed");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
        }),
    )
}
