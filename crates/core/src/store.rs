//! ContextStore trait: sole owner of every context record.
//!
//! Callers never get a mutable handle. They receive snapshots (clones) from
//! `get`, or the post-merge snapshot from `merge` / `transition`.
//!
//! Implementations: in-memory (`parley-store`). A persistent backend only
//! needs to honour the same merge semantics, which live in
//! [`ContextRecord::apply`].

use async_trait::async_trait;

use crate::context::{ContextId, ContextRecord, UpdatePayload};
use crate::error::ContextError;

/// Derives a turn's payload from the pre-update snapshot.
pub type PayloadFn = Box<dyn FnOnce(&ContextRecord) -> UpdatePayload + Send>;

/// Result of an atomic read-derive-merge on one record.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Snapshot taken before the payload was applied
    pub before: ContextRecord,
    /// The payload that was applied
    pub payload: UpdatePayload,
    /// Snapshot after the merge
    pub after: ContextRecord,
}

#[async_trait]
pub trait ContextStore: Send + Sync {
    /// The backend name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Allocate a fresh record at turn zero. Always succeeds.
    async fn create(&self, user_id: &str) -> ContextRecord;

    /// Snapshot of a stored record.
    async fn get(&self, id: &ContextId) -> Result<ContextRecord, ContextError>;

    /// Merge a payload into a record and return the post-merge snapshot.
    ///
    /// Serialized per id; an unknown id fails without touching any record.
    async fn merge(&self, id: &ContextId, payload: &UpdatePayload) -> Result<ContextRecord, ContextError>;

    /// Derive a payload from the current state and merge it while holding the
    /// record's lock, so two turns on one conversation can never both build on
    /// the same pre-update snapshot.
    async fn transition(&self, id: &ContextId, derive: PayloadFn) -> Result<Transition, ContextError>;

    /// Explicit eviction. Returns `true` if a record was removed.
    async fn remove(&self, id: &ContextId) -> bool;

    /// Number of live records.
    async fn count(&self) -> usize;
}
