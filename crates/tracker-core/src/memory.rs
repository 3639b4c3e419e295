//! In-memory collaborators.
//!
//! `InMemoryChain` answers chain queries from a fixed set of block records
//! and keeps a log of every call it received. It refuses queries against
//! blocks that were already unpinned, which makes it a strict check of the
//! tracker's pin discipline. `RecordingSink` keeps every notification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracker_types::{BlockHash, ChainData, ChainDataError, OutputSink, Settled, TxHash};

/// Chain contents of a single block.
///
/// Validity and success default to `true` for transactions not listed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
	#[serde(default)]
	pub body: Vec<TxHash>,
	#[serde(default)]
	pub valid: HashMap<TxHash, bool>,
	#[serde(default)]
	pub successful: HashMap<TxHash, bool>,
}

impl BlockRecord {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_body<I, T>(mut self, body: I) -> Self
	where
		I: IntoIterator<Item = T>,
		T: Into<TxHash>,
	{
		self.body = body.into_iter().map(Into::into).collect();
		self
	}

	pub fn with_validity(mut self, tx: impl Into<TxHash>, valid: bool) -> Self {
		self.valid.insert(tx.into(), valid);
		self
	}

	pub fn with_success(mut self, tx: impl Into<TxHash>, successful: bool) -> Self {
		self.successful.insert(tx.into(), successful);
		self
	}

	fn is_valid(&self, tx: &TxHash) -> bool {
		self.valid.get(tx).copied().unwrap_or(true)
	}
}

/// A call received by [`InMemoryChain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "camelCase")]
pub enum ChainCall {
	#[serde(rename_all = "camelCase")]
	GetBody { block_hash: BlockHash },
	#[serde(rename_all = "camelCase")]
	IsTxValid { block_hash: BlockHash, tx: TxHash },
	#[serde(rename_all = "camelCase")]
	IsTxSuccessful { block_hash: BlockHash, tx: TxHash },
	#[serde(rename_all = "camelCase")]
	Unpin { block_hashes: Vec<BlockHash> },
}

#[derive(Debug, Default)]
struct ChainLog {
	calls: Vec<ChainCall>,
	unpinned: Vec<BlockHash>,
	failing: HashSet<TxHash>,
}

#[derive(Debug, Default)]
pub struct InMemoryChain {
	blocks: HashMap<BlockHash, BlockRecord>,
	log: Mutex<ChainLog>,
}

impl InMemoryChain {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn from_blocks(blocks: HashMap<BlockHash, BlockRecord>) -> Self {
		Self {
			blocks,
			log: Mutex::new(ChainLog::default()),
		}
	}

	pub fn with_block(mut self, hash: impl Into<BlockHash>, record: BlockRecord) -> Self {
		self.blocks.insert(hash.into(), record);
		self
	}

	/// Every call received so far, in order.
	pub async fn calls(&self) -> Vec<ChainCall> {
		self.log.lock().await.calls.clone()
	}

	/// Unpinned blocks in the order they were released.
	pub async fn unpinned(&self) -> Vec<BlockHash> {
		self.log.lock().await.unpinned.clone()
	}

	/// Makes validity queries for `tx` fail until [`Self::clear_failures`].
	pub async fn fail_validity_for(&self, tx: impl Into<TxHash>) {
		self.log.lock().await.failing.insert(tx.into());
	}

	pub async fn clear_failures(&self) {
		self.log.lock().await.failing.clear();
	}

	fn record<'a>(
		&'a self,
		log: &ChainLog,
		block_hash: &BlockHash,
	) -> Result<&'a BlockRecord, ChainDataError> {
		if log.unpinned.contains(block_hash) {
			return Err(ChainDataError::Pruned(block_hash.clone()));
		}
		self.blocks
			.get(block_hash)
			.ok_or_else(|| ChainDataError::UnknownBlock(block_hash.clone()))
	}
}

#[async_trait]
impl ChainData for InMemoryChain {
	async fn get_body(&self, block_hash: &BlockHash) -> Result<Vec<TxHash>, ChainDataError> {
		let mut log = self.log.lock().await;
		log.calls.push(ChainCall::GetBody {
			block_hash: block_hash.clone(),
		});

		Ok(self.record(&log, block_hash)?.body.clone())
	}

	async fn is_tx_valid(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError> {
		let mut log = self.log.lock().await;
		log.calls.push(ChainCall::IsTxValid {
			block_hash: block_hash.clone(),
			tx: tx.clone(),
		});

		if log.failing.contains(tx) {
			return Err(ChainDataError::Query(format!(
				"validity of {} unavailable",
				tx
			)));
		}
		Ok(self.record(&log, block_hash)?.is_valid(tx))
	}

	async fn is_tx_successful(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError> {
		let mut log = self.log.lock().await;
		log.calls.push(ChainCall::IsTxSuccessful {
			block_hash: block_hash.clone(),
			tx: tx.clone(),
		});

		let record = self.record(&log, block_hash)?;
		if !record.is_valid(tx) || !record.body.contains(tx) {
			return Err(ChainDataError::Query(format!(
				"{} is not a valid transaction of {}",
				tx, block_hash
			)));
		}
		Ok(record.successful.get(tx).copied().unwrap_or(true))
	}

	async fn unpin(&self, block_hashes: &[BlockHash]) -> Result<(), ChainDataError> {
		let mut log = self.log.lock().await;
		log.calls.push(ChainCall::Unpin {
			block_hashes: block_hashes.to_vec(),
		});
		log.unpinned.extend(block_hashes.iter().cloned());
		Ok(())
	}
}

/// A notification emitted by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Notification {
	Settled { tx: TxHash, outcome: Settled },
	Done { tx: TxHash, outcome: Settled },
}

#[derive(Debug, Default)]
pub struct RecordingSink {
	notifications: Mutex<Vec<Notification>>,
}

impl RecordingSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub async fn notifications(&self) -> Vec<Notification> {
		self.notifications.lock().await.clone()
	}
}

#[async_trait]
impl OutputSink for RecordingSink {
	async fn on_tx_settled(&self, tx: &TxHash, outcome: &Settled) {
		self.notifications.lock().await.push(Notification::Settled {
			tx: tx.clone(),
			outcome: outcome.clone(),
		});
	}

	async fn on_tx_done(&self, tx: &TxHash, outcome: &Settled) {
		self.notifications.lock().await.push(Notification::Done {
			tx: tx.clone(),
			outcome: outcome.clone(),
		});
	}
}
