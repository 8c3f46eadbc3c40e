//! Update pipeline: turns one message plus the current context into the
//! payload for this turn.
//!
//! The pipeline never writes to the store itself. Committing the payload is
//! the caller's job, which lets the composer see both the pre-update context
//! and the payload.

use std::sync::Arc;

use chrono::Utc;
use parley_core::context::{ContextRecord, ContextValue, UpdatePayload, meta};

use crate::extractor::Extractor;

#[derive(Clone)]
pub struct UpdatePipeline {
    extractor: Arc<Extractor>,
}

impl UpdatePipeline {
    pub fn new(extractor: Extractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }

    /// Build the payload for `message` on top of `current`.
    ///
    /// The turn count is always `current.turn_count + 1`. Entities hold
    /// only what this message yielded; metadata always carries the sentiment
    /// and the time the message was processed.
    pub fn process(&self, message: &str, current: &ContextRecord) -> UpdatePayload {
        let extraction = self.extractor.extract(message);

        let mut payload = UpdatePayload::new(current.turn_count + 1);
        payload.entities = extraction.entities;
        payload.metadata.insert(
            meta::SENTIMENT.to_string(),
            ContextValue::from(extraction.sentiment.as_str()),
        );
        payload
            .metadata
            .insert(meta::LAST_MESSAGE_TIME.to_string(), ContextValue::Timestamp(Utc::now()));
        payload
    }
}

impl Default for UpdatePipeline {
    fn default() -> Self {
        Self::new(Extractor::new())
    }
}
