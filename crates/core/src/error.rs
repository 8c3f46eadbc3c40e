//! Error types for the Parley domain.
//!
//! Extraction and composition are total, so the only domain failure is an
//! unknown context id. Transport and configuration errors live with the
//! crates that raise them.

use thiserror::Error;

use crate::context::ContextId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The store holds no record under this id. Never retried internally:
    /// the caller either creates a fresh context or reports upward.
    #[error("Context not found: {0}")]
    NotFound(ContextId),
}

impl ContextError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContextError::NotFound(_))
    }
}
