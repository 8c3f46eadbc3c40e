//! Context record domain types.
//!
//! A [`ContextRecord`] is the state of one conversation: what has been learned
//! about the user, how they felt last turn, and how many turns have passed.
//! An [`UpdatePayload`] is the per-turn delta merged into it.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Well-known entity kinds.
pub mod entity {
    pub const PERSON_NAME: &str = "person_name";
    pub const LOCATION: &str = "location";
}

/// Well-known metadata keys written by the update pipeline.
pub mod meta {
    pub const SENTIMENT: &str = "sentiment";
    pub const LAST_MESSAGE_TIME: &str = "last_message_time";
}

/// Unique identifier for a context record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub String);

impl ContextId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ContextId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ContextId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ContextId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scalar stored under a metadata or preference key.
///
/// Adjacently tagged on the wire (`{"type": "text", "value": "positive"}`)
/// so a round trip keeps the variant: text that looks like a date stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContextValue {
    Bool(bool),
    Integer(i64),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl ContextValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContextValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            ContextValue::Timestamp(t) => Some(*t),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContextValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextValue::Bool(b) => write!(f, "{b}"),
            ContextValue::Integer(i) => write!(f, "{i}"),
            ContextValue::Number(n) => write!(f, "{n}"),
            ContextValue::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            ContextValue::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        ContextValue::Text(s.to_string())
    }
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        ContextValue::Text(s)
    }
}

impl From<bool> for ContextValue {
    fn from(b: bool) -> Self {
        ContextValue::Bool(b)
    }
}

impl From<i64> for ContextValue {
    fn from(i: i64) -> Self {
        ContextValue::Integer(i)
    }
}

impl From<f64> for ContextValue {
    fn from(n: f64) -> Self {
        ContextValue::Number(n)
    }
}

impl From<DateTime<Utc>> for ContextValue {
    fn from(t: DateTime<Utc>) -> Self {
        ContextValue::Timestamp(t)
    }
}

/// Coarse sentiment of a single message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sentiment label: {0}")]
pub struct ParseSentimentError(pub String);

impl FromStr for Sentiment {
    type Err = ParseSentimentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(ParseSentimentError(other.to_string())),
        }
    }
}

/// The stored state of one conversation.
///
/// Only a [`ContextStore`](crate::store::ContextStore) mutates records;
/// everyone else works with snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRecord {
    /// Permanent identity of this record
    pub context_id: ContextId,

    /// Owner, fixed at creation
    pub user_id: String,

    pub created_at: DateTime<Utc>,

    /// Bumped on every successful merge
    pub updated_at: DateTime<Utc>,

    /// Number of processed user messages
    #[serde(rename = "conversation_turns", alias = "turn_count")]
    pub turn_count: u64,

    /// Entity kind → last extracted value
    #[serde(default)]
    pub entities: BTreeMap<String, String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, ContextValue>,

    #[serde(default)]
    pub preferences: BTreeMap<String, ContextValue>,
}

impl ContextRecord {
    /// A fresh record at turn zero with empty maps.
    pub fn new(user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            context_id: ContextId::new(),
            user_id: user_id.into(),
            created_at: now,
            updated_at: now,
            turn_count: 0,
            entities: BTreeMap::new(),
            metadata: BTreeMap::new(),
            preferences: BTreeMap::new(),
        }
    }

    /// Merge a payload into this record.
    ///
    /// Keys present in the payload overwrite, keys absent are kept, nothing is
    /// removed. The turn count is replaced outright. Identity fields and
    /// `created_at` are never touched.
    pub fn apply(&mut self, payload: &UpdatePayload) {
        self.entities
            .extend(payload.entities.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.metadata
            .extend(payload.metadata.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.preferences
            .extend(payload.preferences.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.turn_count = payload.turn_count;
        self.updated_at = Utc::now().max(self.updated_at);
    }

    pub fn entity(&self, kind: &str) -> Option<&str> {
        self.entities.get(kind).map(String::as_str)
    }
}

/// The delta produced by one turn.
///
/// Never stored by itself. It is merged into the record and also handed,
/// unmerged, to the response composer so it can tell freshly learned facts
/// from ones already known.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdatePayload {
    #[serde(rename = "conversation_turns", alias = "turn_count")]
    pub turn_count: u64,

    #[serde(default)]
    pub entities: BTreeMap<String, String>,

    #[serde(default)]
    pub metadata: BTreeMap<String, ContextValue>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub preferences: BTreeMap<String, ContextValue>,
}

impl UpdatePayload {
    pub fn new(turn_count: u64) -> Self {
        Self {
            turn_count,
            ..Self::default()
        }
    }

    pub fn with_entity(mut self, kind: impl Into<String>, value: impl Into<String>) -> Self {
        self.entities.insert(kind.into(), value.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_preference(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.preferences.insert(key.into(), value.into());
        self
    }

    pub fn entity(&self, kind: &str) -> Option<&str> {
        self.entities.get(kind).map(String::as_str)
    }

    /// Sentiment recorded in the metadata, if any.
    pub fn sentiment(&self) -> Option<Sentiment> {
        self.metadata
            .get(meta::SENTIMENT)
            .and_then(ContextValue::as_text)
            .and_then(|s| s.parse().ok())
    }
}
