//! Response composition.
//!
//! Reply parts are appended in a fixed order and joined with single spaces:
//!
//! 1. greeting, when the payload names the person
//! 2. location acknowledgement, when a location is learned for the first time
//! 3. sentiment acknowledgement, unless neutral
//! 4. echo of the message, or the turn-count fallback when nothing else applied
//!
//! "Already known" is always judged against the pre-update context.

use parley_core::context::{ContextRecord, Sentiment, UpdatePayload, entity};

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub fn new() -> Self {
        Self
    }

    pub fn compose(&self, message: &str, before: &ContextRecord, payload: &UpdatePayload) -> String {
        let mut parts: Vec<String> = Vec::new();

        if let Some(name) = payload.entity(entity::PERSON_NAME) {
            if before.entity(entity::PERSON_NAME) == Some(name) {
                parts.push(format!("Hello again, {name}!"));
            } else {
                parts.push(format!("Nice to meet you, {name}!"));
            }
        }

        if let Some(location) = payload.entity(entity::LOCATION) {
            if before.entity(entity::LOCATION).is_none() {
                parts.push(format!("I see you're in {location}."));
            }
        }

        match payload.sentiment() {
            Some(Sentiment::Positive) => parts.push("I'm glad you're feeling positive!".into()),
            Some(Sentiment::Negative) => {
                parts.push("I'm sorry to hear that you're not feeling great.".into())
            }
            Some(Sentiment::Neutral) | None => {}
        }

        if parts.is_empty() {
            parts.push(format!(
                "This is conversation turn #{}. You said: {message}",
                payload.turn_count
            ));
        } else {
            parts.push(format!("You said: {message}"));
        }

        parts.join(" ")
    }
}
