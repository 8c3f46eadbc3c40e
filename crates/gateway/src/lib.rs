//! HTTP API gateway for Parley.
//!
//! Thin transport over the turn engine: it validates the request shape,
//! resolves which context a request belongs to, and shapes the outcome
//! into JSON. All state transitions happen in `parley-engine`.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::{Router, extract::State, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use parley_config::AppConfig;
use parley_core::event::EventBus;
use parley_engine::{Extractor, SentimentLexicon, TurnEngine};
use parley_store::InMemoryContextStore;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub engine: TurnEngine,
    /// User id for requests that do not name one
    pub default_user_id: String,
    pub start_time: chrono::DateTime<chrono::Utc>,
}

pub type SharedState = Arc<GatewayState>;

impl GatewayState {
    /// Build the state for `config`: a fresh in-memory store and an engine
    /// using the configured sentiment lexicon.
    pub fn from_config(config: &AppConfig, events: Arc<EventBus>) -> Self {
        let lexicon = SentimentLexicon::new(
            &config.sentiment.positive_words,
            &config.sentiment.negative_words,
        );
        let engine = TurnEngine::new(Arc::new(InMemoryContextStore::new()))
            .with_extractor(Extractor::new().with_lexicon(lexicon))
            .with_event_bus(events);
        Self {
            engine,
            default_user_id: config.default_user_id.clone(),
            start_time: chrono::Utc::now(),
        }
    }
}

/// Build the router with every gateway route.
///
/// Layers applied:
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state.clone())
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.bind_addr();

    let events = Arc::new(EventBus::default());
    spawn_event_logger(&events);

    let state = Arc::new(GatewayState::from_config(&config, events));

    let mut app = build_router(state);
    if config.gateway.cors_permissive {
        app = app.layer(CorsLayer::permissive());
    }

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Log every domain event at debug level until the bus closes.
fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(event = ?event, "Domain event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Event logger lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });
}

// --- Handlers ---

#[derive(Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Parley context API".into(),
    })
}

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    pub contexts: usize,
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        uptime_secs: (chrono::Utc::now() - state.start_time).num_seconds(),
        contexts: state.engine.store().count().await,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        Arc::new(GatewayState::from_config(
            &AppConfig::default(),
            Arc::new(EventBus::default()),
        ))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let health: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(health.status, "healthy");
        assert_eq!(health.contexts, 0);
    }

    #[tokio::test]
    async fn root_endpoint() {
        let app = build_router(test_state());

        let req = Request::builder().uri("/").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let root: RootResponse = serde_json::from_slice(&body).unwrap();
        assert!(root.message.contains("Parley"));
    }

    #[tokio::test]
    async fn configured_lexicon_reaches_engine() {
        let mut config = AppConfig::default();
        config.sentiment.positive_words = vec!["stoked".into()];
        let state = Arc::new(GatewayState::from_config(&config, Arc::new(EventBus::default())));

        let ctx = state.engine.open(None, "u1").await;
        let outcome = state.engine.handle(&ctx.context_id, "so stoked").await.unwrap();
        assert!(outcome.reply.starts_with("I'm glad"));
    }
}
