//! Turn processing, the heart of Parley.
//!
//! Each user message runs through the same cycle:
//!
//! 1. **Extract** entities and sentiment from the raw text
//! 2. **Derive** an update payload from the current context (turn + 1)
//! 3. **Compose** a reply from the pre-update context and the payload
//! 4. **Merge** the payload into the stored context
//!
//! Steps 2 and 4 happen under the store's per-record lock so concurrent
//! turns on one conversation cannot lose updates.

pub mod extractor;
pub mod pipeline;
pub mod composer;
pub mod turn;

pub use extractor::{EntityRule, Extraction, Extractor, LocationRule, PersonNameRule, SentimentLexicon};
pub use pipeline::UpdatePipeline;
pub use composer::ResponseComposer;
pub use turn::{TurnEngine, TurnOutcome};
