//! Context store implementations for Parley.

pub mod in_memory;

pub use in_memory::InMemoryContextStore;
