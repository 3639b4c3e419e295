//! Transaction lifecycle tracker.
//!
//! Every submitted transaction walks `submitted -> settled -> done`. The
//! tracker settles pending transactions against each new block, completes
//! them when their settling block becomes part of the finalized chain, and
//! hands blocks back to the chain data API as soon as nothing will query
//! them again.

use crate::blocks::BlockIndex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracker_monitoring::TrackerMetrics;
use tracker_types::{BlockHash, ChainData, OutputSink, Result, Settled, TrackerEvent, TxHash};

/// Lifecycle position of a tracked transaction.
///
/// `seq` is the transaction's position in the submission queue and orders
/// every notification the tracker emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxStatus {
	Submitted { seq: usize },
	Settled { seq: usize, block_hash: BlockHash },
	Done,
}

pub struct TxTracker<C, S> {
	chain: C,
	sink: S,
	/// Submission order. Append-only, one entry per identifier.
	queue: Vec<TxHash>,
	statuses: HashMap<TxHash, TxStatus>,
	/// Outcomes per settling block, in the order they were recorded.
	settlements: HashMap<BlockHash, Vec<(TxHash, Settled)>>,
	blocks: BlockIndex,
	metrics: Arc<TrackerMetrics>,
}

impl<C: ChainData, S: OutputSink> TxTracker<C, S> {
	pub fn new(chain: C, sink: S) -> Self {
		Self::with_metrics(chain, sink, Arc::new(TrackerMetrics::new()))
	}

	pub fn with_metrics(chain: C, sink: S, metrics: Arc<TrackerMetrics>) -> Self {
		Self {
			chain,
			sink,
			queue: Vec::new(),
			statuses: HashMap::new(),
			settlements: HashMap::new(),
			blocks: BlockIndex::new(),
			metrics,
		}
	}

	/// Processes one event to completion.
	///
	/// A failing chain query aborts the rest of the event. Transactions
	/// settled before the failure keep their notification; the others stay
	/// pending for the next block.
	pub async fn handle(&mut self, event: TrackerEvent) -> Result<()> {
		self.metrics.record_event();

		match event {
			TrackerEvent::NewTransaction { value } => {
				self.on_new_transaction(value);
				Ok(())
			}
			TrackerEvent::NewBlock { block_hash, parent } => {
				self.on_new_block(block_hash, parent).await
			}
			TrackerEvent::Finalized { block_hash } => self.on_finalized(block_hash).await,
		}
	}

	fn on_new_transaction(&mut self, tx: TxHash) {
		if self.statuses.contains_key(&tx) {
			debug!("Ignoring resubmission of {}", tx);
			return;
		}

		let seq = self.queue.len();
		self.statuses.insert(tx.clone(), TxStatus::Submitted { seq });
		debug!("Tracking {} at position {}", tx, seq);
		self.queue.push(tx);
	}

	async fn on_new_block(
		&mut self,
		block_hash: BlockHash,
		parent: Option<BlockHash>,
	) -> Result<()> {
		if !self.blocks.insert(block_hash.clone(), parent.clone()) {
			debug!("Ignoring repeated announcement of block {}", block_hash);
			return Ok(());
		}

		self.settle_pending(&block_hash).await?;

		if let Some(parent) = parent {
			if self.blocks.release(&parent) || self.blocks.release_inherited(&parent) {
				self.unpin(vec![parent]).await;
			}
		}

		Ok(())
	}

	/// Scans pending transactions in submission order against `block_hash`.
	///
	/// Validity is asked once per candidate. The body is fetched only when a
	/// candidate turns out valid, and success only for valid transactions
	/// the body includes.
	async fn settle_pending(&mut self, block_hash: &BlockHash) -> Result<()> {
		let candidates: Vec<(usize, TxHash)> = self
			.queue
			.iter()
			.filter_map(|tx| match self.statuses.get(tx) {
				Some(TxStatus::Submitted { seq }) => Some((*seq, tx.clone())),
				_ => None,
			})
			.collect();

		for (seq, tx) in candidates {
			self.metrics.record_validity_query();
			let valid = self.chain.is_tx_valid(block_hash, &tx).await?;

			let outcome = if !valid {
				Settled::invalid(block_hash.clone())
			} else if self.is_included(block_hash, &tx).await? {
				self.metrics.record_success_query();
				let successful = self.chain.is_tx_successful(block_hash, &tx).await?;
				Settled::valid(block_hash.clone(), successful)
			} else {
				debug!("{} is valid but not included in {}", tx, block_hash);
				continue;
			};

			self.record_settlement(seq, tx, outcome).await;
		}

		Ok(())
	}

	async fn is_included(&mut self, block_hash: &BlockHash, tx: &TxHash) -> Result<bool> {
		if self.blocks.body(block_hash).is_none() {
			self.metrics.record_body_fetch();
			let body = self.chain.get_body(block_hash).await?;
			debug!("Fetched body of {} with {} transactions", block_hash, body.len());
			self.blocks.cache_body(block_hash, body);
		}

		Ok(self
			.blocks
			.body(block_hash)
			.is_some_and(|body| body.contains(tx)))
	}

	async fn record_settlement(&mut self, seq: usize, tx: TxHash, outcome: Settled) {
		let block_hash = outcome.block_hash().clone();

		self.statuses.insert(
			tx.clone(),
			TxStatus::Settled {
				seq,
				block_hash: block_hash.clone(),
			},
		);
		self.settlements
			.entry(block_hash)
			.or_default()
			.push((tx.clone(), outcome.clone()));

		info!("Transaction {} settled: {:?}", tx, outcome);
		self.metrics.record_settled();
		self.sink.on_tx_settled(&tx, &outcome).await;
	}

	async fn on_finalized(&mut self, block_hash: BlockHash) -> Result<()> {
		let Some(finalization) = self.blocks.finalize(&block_hash) else {
			if self.blocks.release_inherited(&block_hash) {
				debug!("Finalized block {} was never announced", block_hash);
				self.unpin(vec![block_hash]).await;
			} else {
				debug!("Ignoring finalization of unknown block {}", block_hash);
			}
			return Ok(());
		};

		let mut completed: Vec<(usize, TxHash, Settled)> = Vec::new();
		for finalized in &finalization.chain {
			for (tx, outcome) in self.settlements.remove(finalized).unwrap_or_default() {
				if let Some(TxStatus::Settled { seq, .. }) = self.statuses.get(&tx) {
					completed.push((*seq, tx, outcome));
				}
			}
		}
		completed.sort_by_key(|(seq, _, _)| *seq);

		for (_, tx, outcome) in completed {
			self.statuses.insert(tx.clone(), TxStatus::Done);
			info!("Transaction {} done: {:?}", tx, outcome);
			self.metrics.record_done();
			self.sink.on_tx_done(&tx, &outcome).await;
		}

		for pruned in &finalization.pruned {
			if let Some(orphaned) = self.settlements.remove(pruned) {
				warn!(
					"Discarding {} settlements of pruned block {}",
					orphaned.len(),
					pruned
				);
			}
		}

		info!(
			"Finalized {} ({} blocks on chain, {} pruned)",
			block_hash,
			finalization.chain.len(),
			finalization.pruned.len()
		);
		self.unpin(finalization.unpin).await;

		Ok(())
	}

	async fn unpin(&self, block_hashes: Vec<BlockHash>) {
		if block_hashes.is_empty() {
			return;
		}

		match self.chain.unpin(&block_hashes).await {
			Ok(()) => {
				debug!("Unpinned {:?}", block_hashes);
				self.metrics.record_unpinned(block_hashes.len());
			}
			Err(e) => warn!("Failed to unpin {:?}: {}", block_hashes, e),
		}
	}

	pub fn status(&self, tx: &TxHash) -> Option<&TxStatus> {
		self.statuses.get(tx)
	}

	pub fn is_done(&self, tx: &TxHash) -> bool {
		matches!(self.statuses.get(tx), Some(TxStatus::Done))
	}

	/// Transactions not yet settled, in submission order.
	pub fn pending(&self) -> Vec<&TxHash> {
		self.queue
			.iter()
			.filter(|tx| matches!(self.statuses.get(*tx), Some(TxStatus::Submitted { .. })))
			.collect()
	}

	/// Outcomes recorded for a block that has not been finalized or pruned yet.
	pub fn settlements(&self, block_hash: &BlockHash) -> Option<&[(TxHash, Settled)]> {
		self.settlements.get(block_hash).map(Vec::as_slice)
	}

	pub fn tracked_blocks(&self) -> Vec<BlockHash> {
		self.blocks.hashes()
	}

	pub fn metrics(&self) -> Arc<TrackerMetrics> {
		self.metrics.clone()
	}
}
