//! Shared types for the transaction tracker.
//!
//! This crate holds the vocabulary every other tracker crate speaks: the
//! opaque hash identifiers, the incoming chain events, the settlement
//! outcomes reported to observers, and the two collaborator seams the
//! tracker talks to (`ChainData` and `OutputSink`).

pub mod chain;
pub mod common;
pub mod errors;
pub mod events;
pub mod settlement;
pub mod sink;

pub use chain::*;
pub use common::*;
pub use errors::*;
pub use events::*;
pub use settlement::*;
pub use sink::*;
