//! Chain data access consumed by the tracker.

use crate::{
	common::{BlockHash, TxHash},
	errors::ChainDataError,
};
use async_trait::async_trait;
use std::sync::Arc;

/// Read access to chain state plus the pin release hook.
///
/// Queries are side-effect free with respect to tracker state and may be
/// repeated, but the tracker keeps them to a minimum: one body fetch per
/// block, one validity check per (block, transaction) and success checks
/// only for valid, included transactions.
#[async_trait]
pub trait ChainData: Send + Sync {
	/// Transactions included in the block, in block order.
	async fn get_body(&self, block_hash: &BlockHash) -> Result<Vec<TxHash>, ChainDataError>;

	/// Whether the transaction is valid in the context of the block.
	async fn is_tx_valid(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError>;

	/// Whether an included, valid transaction executed successfully.
	async fn is_tx_successful(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError>;

	/// Release retained state for the given blocks. Irreversible.
	async fn unpin(&self, block_hashes: &[BlockHash]) -> Result<(), ChainDataError>;
}

#[async_trait]
impl<T: ChainData + ?Sized> ChainData for Arc<T> {
	async fn get_body(&self, block_hash: &BlockHash) -> Result<Vec<TxHash>, ChainDataError> {
		(**self).get_body(block_hash).await
	}

	async fn is_tx_valid(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError> {
		(**self).is_tx_valid(block_hash, tx).await
	}

	async fn is_tx_successful(
		&self,
		block_hash: &BlockHash,
		tx: &TxHash,
	) -> Result<bool, ChainDataError> {
		(**self).is_tx_successful(block_hash, tx).await
	}

	async fn unpin(&self, block_hashes: &[BlockHash]) -> Result<(), ChainDataError> {
		(**self).unpin(block_hashes).await
	}
}
