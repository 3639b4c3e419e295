//! Core of the transaction tracker.
//!
//! [`TxTracker`] turns a stream of chain events into exactly-once
//! `settled` and `done` notifications, [`BlockIndex`] keeps the minimal
//! ancestry needed to decide what finality releases, and
//! [`TrackerService`] drives a tracker from a channel.

pub mod blocks;
pub mod memory;
pub mod service;
pub mod tracker;

pub use blocks::{BlockIndex, Finalization};
pub use memory::{BlockRecord, ChainCall, InMemoryChain, Notification, RecordingSink};
pub use service::{TrackerHandle, TrackerService};
pub use tracker::{TxStatus, TxTracker};
