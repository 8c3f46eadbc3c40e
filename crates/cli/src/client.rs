//! HTTP client for a running Parley gateway.
//!
//! Keeps the conversation history and a local copy of the context, and
//! folds each turn's `context_updates` into it the same way the server
//! merges them.

use chrono::{DateTime, Local, Utc};
use parley_core::context::{ContextId, ContextRecord, ContextValue, UpdatePayload};
use parley_core::message::ChatMessage;
use parley_gateway::api_v1::{ChatCompletionRequest, ChatCompletionResponse};
use serde_json::map::Entry;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Could not connect to {url}. Make sure the server is running.")]
    Connection { url: String },

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Invalid response from server: {0}")]
    Decode(String),
}

impl ClientError {
    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_connect() {
            ClientError::Connection { url: url.to_string() }
        } else {
            ClientError::Request(err.to_string())
        }
    }
}

pub struct ChatClient {
    http: reqwest::Client,
    base_url: String,
    history: Vec<ChatMessage>,
    context: Map<String, Value>,
}

impl ChatClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            history: Vec::new(),
            context: Map::new(),
        }
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// Local view of the context, as sent with every request.
    pub fn context(&self) -> &Map<String, Value> {
        &self.context
    }

    pub fn context_id(&self) -> Option<ContextId> {
        self.context
            .get("context_id")
            .and_then(Value::as_str)
            .map(ContextId::from)
    }

    /// Send one user message. On failure the message is dropped from the
    /// history so the next attempt starts from a consistent conversation.
    pub async fn send(&mut self, message: &str) -> Result<ChatCompletionResponse, ClientError> {
        self.history.push(ChatMessage::user(message));
        let request = ChatCompletionRequest {
            messages: self.history.clone(),
            context: Some(self.context.clone()),
            user: None,
        };

        match self.post(&request).await {
            Ok(response) => {
                self.fold_updates(&response.context_id, &response.context_updates);
                self.history.push(ChatMessage::assistant(&response.response));
                Ok(response)
            }
            Err(e) => {
                self.history.pop();
                Err(e)
            }
        }
    }

    async fn post(&self, request: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ClientError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.base_url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), "Chat request rejected");
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Fetch the authoritative snapshot of this conversation's context.
    pub async fn fetch_context(&self) -> Result<Option<ContextRecord>, ClientError> {
        let Some(id) = self.context_id() else {
            return Ok(None);
        };
        let url = format!("{}/v1/contexts/{id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::from_reqwest(&self.base_url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map(Some)
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// Fold one turn into the local context: nested maps merge key by key,
    /// everything else is replaced.
    pub fn fold_updates(&mut self, context_id: &ContextId, updates: &UpdatePayload) {
        self.context
            .insert("context_id".into(), Value::String(context_id.to_string()));

        let Ok(Value::Object(fields)) = serde_json::to_value(updates) else {
            return;
        };
        for (key, value) in fields {
            match self.context.entry(key) {
                Entry::Occupied(mut slot) => match (slot.get_mut(), value) {
                    (Value::Object(existing), Value::Object(incoming)) => existing.extend(incoming),
                    (current, value) => *current = value,
                },
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }
    }
}

fn local_time(t: &DateTime<Utc>) -> String {
    t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

fn display_value(value: &ContextValue) -> String {
    match value {
        ContextValue::Timestamp(t) => local_time(t),
        other => other.to_string(),
    }
}

/// Human-readable dump of a context record.
pub fn render_context(record: &ContextRecord) -> String {
    let mut out = vec![
        "===== CONTEXT =====".to_string(),
        format!("Context ID: {}", record.context_id),
        format!("User ID: {}", record.user_id),
        format!("Conversation Turns: {}", record.turn_count),
        format!("Created At: {}", local_time(&record.created_at)),
        format!("Updated At: {}", local_time(&record.updated_at)),
    ];

    if !record.entities.is_empty() {
        out.push("\n--- Entities ---".into());
        out.extend(record.entities.iter().map(|(k, v)| format!("{k}: {v}")));
    }

    if !record.metadata.is_empty() {
        out.push("\n--- Metadata ---".into());
        out.extend(record.metadata.iter().map(|(k, v)| format!("{k}: {}", display_value(v))));
    }

    if !record.preferences.is_empty() {
        out.push("\n--- Preferences ---".into());
        out.extend(record.preferences.iter().map(|(k, v)| format!("{k}: {}", display_value(v))));
    }

    out.push("=================".into());
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_config::AppConfig;
    use parley_core::event::EventBus;
    use parley_gateway::GatewayState;
    use std::sync::Arc;

    async fn spawn_gateway() -> String {
        let state = Arc::new(GatewayState::from_config(
            &AppConfig::default(),
            Arc::new(EventBus::default()),
        ));
        let app = parley_gateway::build_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn conversation_keeps_context_between_turns() {
        let mut client = ChatClient::new(spawn_gateway().await);

        let first = client.send("My name is Bob").await.unwrap();
        assert!(first.response.starts_with("Nice to meet you, Bob!"));
        let id = client.context_id().expect("context id after first turn");

        let second = client.send("I am in Lisbon. Feeling good").await.unwrap();
        assert_eq!(second.context_id, id);
        assert_eq!(
            second.response,
            "I see you're in Lisbon. I'm glad you're feeling positive! You said: I am in Lisbon. Feeling good"
        );

        assert_eq!(client.history().len(), 4);
        assert_eq!(client.context()["conversation_turns"], 2);
        assert_eq!(client.context()["entities"]["person_name"], "Bob");
        assert_eq!(client.context()["entities"]["location"], "Lisbon");

        let record = client.fetch_context().await.unwrap().unwrap();
        assert_eq!(record.turn_count, 2);
        assert_eq!(record.entity("person_name"), Some("Bob"));
    }

    #[tokio::test]
    async fn connection_failure_rolls_back_history() {
        // Nothing listens on port 1.
        let mut client = ChatClient::new("http://127.0.0.1:1");
        let err = client.send("hello").await.unwrap_err();
        assert!(matches!(err, ClientError::Connection { .. } | ClientError::Request(_)));
        assert!(client.history().is_empty());
        assert!(client.context().is_empty());
    }

    #[tokio::test]
    async fn fetch_without_context_is_none() {
        let client = ChatClient::new("http://127.0.0.1:1");
        assert!(client.fetch_context().await.unwrap().is_none());
    }

    #[test]
    fn fold_merges_nested_maps() {
        let mut client = ChatClient::new("http://localhost:8000");
        let id = ContextId::from("ctx-1");

        client.fold_updates(&id, &UpdatePayload::new(1).with_entity("person_name", "Ann"));
        client.fold_updates(&id, &UpdatePayload::new(2).with_entity("location", "Oslo"));

        assert_eq!(client.context_id(), Some(id));
        assert_eq!(client.context()["conversation_turns"], 2);
        assert_eq!(client.context()["entities"]["person_name"], "Ann");
        assert_eq!(client.context()["entities"]["location"], "Oslo");
    }

    #[test]
    fn render_lists_sections() {
        let mut record = ContextRecord::new("u1");
        record.apply(
            &UpdatePayload::new(1)
                .with_entity("person_name", "Ann")
                .with_metadata("sentiment", "positive")
                .with_preference("units", "metric"),
        );

        let text = render_context(&record);
        assert!(text.contains("User ID: u1"));
        assert!(text.contains("Conversation Turns: 1"));
        assert!(text.contains("person_name: Ann"));
        assert!(text.contains("sentiment: positive"));
        assert!(text.contains("--- Preferences ---"));
        assert!(text.contains("units: metric"));
    }

    #[test]
    fn render_skips_empty_sections() {
        let text = render_context(&ContextRecord::new("u1"));
        assert!(!text.contains("--- Entities ---"));
        assert!(!text.contains("--- Metadata ---"));
    }
}
