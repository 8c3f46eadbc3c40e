//! TurnEngine: runs one complete turn against a context store.

use std::sync::Arc;

use chrono::Utc;
use parley_core::context::{ContextId, ContextRecord, UpdatePayload};
use parley_core::error::ContextError;
use parley_core::event::{DomainEvent, EventBus};
use parley_core::store::ContextStore;
use tracing::{info, warn};

use crate::composer::ResponseComposer;
use crate::extractor::Extractor;
use crate::pipeline::UpdatePipeline;

/// What a caller gets back from one turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub context_id: ContextId,
    /// The composed reply
    pub reply: String,
    /// The payload merged this turn
    pub updates: UpdatePayload,
    /// Post-merge snapshot
    pub context: ContextRecord,
}

/// Wires the pipeline, the composer, and a store into a single turn operation.
pub struct TurnEngine {
    store: Arc<dyn ContextStore>,
    pipeline: UpdatePipeline,
    composer: ResponseComposer,
    events: Arc<EventBus>,
}

impl TurnEngine {
    pub fn new(store: Arc<dyn ContextStore>) -> Self {
        Self {
            store,
            pipeline: UpdatePipeline::default(),
            composer: ResponseComposer::new(),
            events: Arc::new(EventBus::default()),
        }
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.pipeline = UpdatePipeline::new(extractor);
        self
    }

    pub fn with_event_bus(mut self, events: Arc<EventBus>) -> Self {
        self.events = events;
        self
    }

    pub fn store(&self) -> &Arc<dyn ContextStore> {
        &self.store
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    /// Resolve the context for a turn.
    ///
    /// A known id yields its stored snapshot. A missing or unknown id gets a
    /// freshly created context for `user_id`.
    pub async fn open(&self, context_id: Option<&ContextId>, user_id: &str) -> ContextRecord {
        if let Some(id) = context_id {
            match self.store.get(id).await {
                Ok(record) => return record,
                Err(ContextError::NotFound(missing)) => {
                    warn!(context_id = %missing, "Unknown context id, starting a new context");
                    self.events.publish(DomainEvent::ContextNotFound {
                        context_id: missing,
                        timestamp: Utc::now(),
                    });
                }
            }
        }

        let record = self.store.create(user_id).await;
        info!(context_id = %record.context_id, user_id, "New conversation context");
        self.events.publish(DomainEvent::ContextCreated {
            context_id: record.context_id.clone(),
            user_id: record.user_id.clone(),
            timestamp: record.created_at,
        });
        record
    }

    /// Process one user message on an existing context.
    ///
    /// The payload is derived and merged under the store's per-record lock;
    /// the reply is composed from the snapshot taken just before the merge.
    pub async fn handle(&self, context_id: &ContextId, message: &str) -> Result<TurnOutcome, ContextError> {
        let pipeline = self.pipeline.clone();
        let text = message.to_owned();
        let transition = self
            .store
            .transition(context_id, Box::new(move |before: &ContextRecord| pipeline.process(&text, before)))
            .await?;

        let reply = self
            .composer
            .compose(message, &transition.before, &transition.payload);

        let sentiment = transition.payload.sentiment().unwrap_or(parley_core::Sentiment::Neutral);
        info!(
            context_id = %context_id,
            turn = transition.payload.turn_count,
            sentiment = %sentiment,
            entities = transition.payload.entities.len(),
            "Turn processed"
        );
        self.events.publish(DomainEvent::TurnCompleted {
            context_id: context_id.clone(),
            turn_count: transition.payload.turn_count,
            sentiment,
            entities_extracted: transition.payload.entities.len(),
            timestamp: Utc::now(),
        });

        Ok(TurnOutcome {
            context_id: context_id.clone(),
            reply,
            updates: transition.payload,
            context: transition.after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_store::InMemoryContextStore;

    fn engine() -> TurnEngine {
        TurnEngine::new(Arc::new(InMemoryContextStore::new()))
    }

    #[tokio::test]
    async fn open_creates_when_absent() {
        let engine = engine();
        let ctx = engine.open(None, "u1").await;
        assert_eq!(ctx.turn_count, 0);
        assert_eq!(engine.store().count().await, 1);
    }

    #[tokio::test]
    async fn open_reuses_known_id() {
        let engine = engine();
        let ctx = engine.open(None, "u1").await;
        let again = engine.open(Some(&ctx.context_id), "someone-else").await;
        assert_eq!(again.context_id, ctx.context_id);
        assert_eq!(again.user_id, "u1");
        assert_eq!(engine.store().count().await, 1);
    }

    #[tokio::test]
    async fn open_replaces_unknown_id() {
        let engine = engine();
        let mut rx = engine.events().subscribe();

        let ctx = engine.open(Some(&ContextId::from("stale")), "u1").await;
        assert_ne!(ctx.context_id, ContextId::from("stale"));

        let first = rx.recv().await.unwrap();
        assert!(matches!(first.as_ref(), DomainEvent::ContextNotFound { .. }));
        let second = rx.recv().await.unwrap();
        assert!(matches!(second.as_ref(), DomainEvent::ContextCreated { .. }));
    }

    #[tokio::test]
    async fn handle_unknown_id_fails() {
        let engine = engine();
        let err = engine.handle(&ContextId::from("nope"), "hi").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn handle_greets_then_welcomes_back() {
        let engine = engine();
        let ctx = engine.open(None, "u1").await;

        let first = engine.handle(&ctx.context_id, "My name is Bob").await.unwrap();
        assert!(first.reply.starts_with("Nice to meet you, Bob!"));
        assert_eq!(first.updates.entity("person_name"), Some("Bob"));
        assert_eq!(first.context.turn_count, 1);

        let second = engine.handle(&ctx.context_id, "My name is Bob").await.unwrap();
        assert!(second.reply.starts_with("Hello again, Bob!"));
        assert_eq!(second.context.turn_count, 2);
    }

    #[tokio::test]
    async fn handle_publishes_turn_completed() {
        let engine = engine();
        let ctx = engine.open(None, "u1").await;
        let mut rx = engine.events().subscribe();

        engine.handle(&ctx.context_id, "I love this").await.unwrap();

        let event = rx.recv().await.unwrap();
        match event.as_ref() {
            DomainEvent::TurnCompleted { turn_count, sentiment, .. } => {
                assert_eq!(*turn_count, 1);
                assert_eq!(*sentiment, parley_core::Sentiment::Positive);
            }
            other => panic!("Expected TurnCompleted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn custom_extractor_is_used() {
        let lexicon = crate::extractor::SentimentLexicon::new(["sunny"], ["cloudy"]);
        let engine = engine().with_extractor(Extractor::new().with_lexicon(lexicon));
        let ctx = engine.open(None, "u1").await;

        let outcome = engine.handle(&ctx.context_id, "so sunny today").await.unwrap();
        assert!(outcome.reply.starts_with("I'm glad you're feeling positive!"));
    }
}
