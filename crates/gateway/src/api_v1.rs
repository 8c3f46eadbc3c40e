//! HTTP API v1.
//!
//! Endpoints:
//!
//! - `POST /v1/chat/completions`: process the final user message of a conversation
//! - `GET  /v1/contexts/{id}`: snapshot of a stored context

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use parley_core::context::{ContextId, ContextRecord, UpdatePayload};
use parley_core::error::ContextError;
use parley_core::message::{ChatMessage, last_user_message};

use crate::SharedState;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedState) -> Router {
    Router::new()
        .route("/chat/completions", post(chat_completions_handler))
        .route("/contexts/{id}", get(get_context_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Conversation so far; the last entry must come from the user.
    pub messages: Vec<ChatMessage>,
    /// Caller-held context. Only `context_id` is read from it.
    #[serde(default)]
    pub context: Option<serde_json::Map<String, serde_json::Value>>,
    /// Owner for a newly created context.
    #[serde(default)]
    pub user: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
    pub response: String,
    /// Id to send back as `context.context_id` on the next turn.
    pub context_id: ContextId,
    pub context_updates: UpdatePayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, detail: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { detail: detail.into() }))
}

impl From<ContextError> for ErrorResponse {
    fn from(err: ContextError) -> Self {
        Self {
            detail: err.to_string(),
        }
    }
}

fn context_error(err: ContextError) -> ApiError {
    (StatusCode::NOT_FOUND, Json(err.into()))
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_completions_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatCompletionRequest>,
) -> Result<Json<ChatCompletionResponse>, ApiError> {
    let Some(message) = last_user_message(&payload.messages) else {
        warn!(messages = payload.messages.len(), "Rejected chat request without trailing user message");
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Last message must be from user",
        ));
    };

    let requested = payload
        .context
        .as_ref()
        .and_then(|c| c.get("context_id"))
        .and_then(serde_json::Value::as_str)
        .map(ContextId::from);

    let user_id = payload
        .user
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or(state.default_user_id.as_str());

    info!(
        has_context = requested.is_some(),
        message_len = message.len(),
        "v1/chat/completions request"
    );

    let context = state.engine.open(requested.as_ref(), user_id).await;
    let outcome = state
        .engine
        .handle(&context.context_id, message)
        .await
        .map_err(context_error)?;

    Ok(Json(ChatCompletionResponse {
        response: outcome.reply,
        context_id: outcome.context_id,
        context_updates: outcome.updates,
    }))
}

async fn get_context_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Result<Json<ContextRecord>, ApiError> {
    state
        .engine
        .store()
        .get(&ContextId::from(id))
        .await
        .map(Json)
        .map_err(context_error)
}

// ── Tests ─────────────────────────────────────────────────────────────────
