//! Notification sink fed by the tracker.

use crate::{common::TxHash, settlement::Settled};
use async_trait::async_trait;
use std::sync::Arc;

/// Observer of transaction lifecycle transitions.
///
/// Each method is invoked at most once per transaction, in submission
/// order within a single event.
#[async_trait]
pub trait OutputSink: Send + Sync {
	/// The transaction's fate in its settling block became known.
	async fn on_tx_settled(&self, tx: &TxHash, outcome: &Settled);

	/// The block the transaction settled in was finalized.
	async fn on_tx_done(&self, tx: &TxHash, outcome: &Settled);
}

#[async_trait]
impl<T: OutputSink + ?Sized> OutputSink for Arc<T> {
	async fn on_tx_settled(&self, tx: &TxHash, outcome: &Settled) {
		(**self).on_tx_settled(tx, outcome).await
	}

	async fn on_tx_done(&self, tx: &TxHash, outcome: &Settled) {
		(**self).on_tx_done(tx, outcome).await
	}
}
