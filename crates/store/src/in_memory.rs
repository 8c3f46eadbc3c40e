//! In-memory context store: process-lifetime, no persistence.

use async_trait::async_trait;
use parley_core::context::{ContextId, ContextRecord, UpdatePayload};
use parley_core::error::ContextError;
use parley_core::store::{ContextStore, PayloadFn, Transition};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

type Slot = Arc<Mutex<ContextRecord>>;

/// Stores records in a map of individually locked slots.
///
/// The map lock is held only long enough to find or insert a slot. Merges
/// then lock the slot alone, so turns on different conversations run in
/// parallel while turns on the same conversation are serialized.
pub struct InMemoryContextStore {
    records: RwLock<HashMap<ContextId, Slot>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    async fn slot(&self, id: &ContextId) -> Result<Slot, ContextError> {
        self.records
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ContextError::NotFound(id.clone()))
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn create(&self, user_id: &str) -> ContextRecord {
        let record = ContextRecord::new(user_id);
        let snapshot = record.clone();
        self.records
            .write()
            .await
            .insert(record.context_id.clone(), Arc::new(Mutex::new(record)));
        debug!(context_id = %snapshot.context_id, user_id, "Context created");
        snapshot
    }

    async fn get(&self, id: &ContextId) -> Result<ContextRecord, ContextError> {
        let slot = self.slot(id).await?;
        let record = slot.lock().await;
        Ok(record.clone())
    }

    async fn merge(&self, id: &ContextId, payload: &UpdatePayload) -> Result<ContextRecord, ContextError> {
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        record.apply(payload);
        debug!(context_id = %id, turn_count = record.turn_count, "Context merged");
        Ok(record.clone())
    }

    async fn transition(&self, id: &ContextId, derive: PayloadFn) -> Result<Transition, ContextError> {
        let slot = self.slot(id).await?;
        let mut record = slot.lock().await;
        let before = record.clone();
        let payload = derive(&before);
        record.apply(&payload);
        debug!(
            context_id = %id,
            from_turn = before.turn_count,
            to_turn = record.turn_count,
            "Context transitioned"
        );
        Ok(Transition {
            before,
            payload,
            after: record.clone(),
        })
    }

    async fn remove(&self, id: &ContextId) -> bool {
        let removed = self.records.write().await.remove(id).is_some();
        if removed {
            debug!(context_id = %id, "Context evicted");
        }
        removed
    }

    async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}
