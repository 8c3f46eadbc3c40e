//! # Parley Core
//!
//! Domain types, traits, and error definitions for Parley, a per-user
//! conversational context service. This crate has **no framework
//! dependencies**: it defines the model every other crate builds on.
//!
//! ## Design Philosophy
//!
//! The context store is defined as a trait here; implementations live in
//! their own crate. This enables:
//! - Swapping the in-memory store for a persistent one without touching callers
//! - Easy testing with stub stores
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod message;
pub mod context;
pub mod store;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::ContextError;
pub use message::{ChatMessage, Role};
pub use context::{ContextId, ContextRecord, ContextValue, Sentiment, UpdatePayload};
pub use store::{ContextStore, PayloadFn, Transition};
pub use event::{DomainEvent, EventBus};
