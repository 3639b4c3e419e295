//! Error types for the tracker.

use crate::common::BlockHash;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Errors surfaced by a `ChainData` implementation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainDataError {
	#[error("Unknown block: {0}")]
	UnknownBlock(BlockHash),

	#[error("Block already unpinned: {0}")]
	Pruned(BlockHash),

	#[error("Query error: {0}")]
	Query(String),
}

#[derive(Error, Debug)]
pub enum TrackerError {
	#[error("Chain data error: {0}")]
	ChainData(#[from] ChainDataError),

	#[error("Event channel closed")]
	ChannelClosed,

	#[error("Shutdown error: {0}")]
	Shutdown(String),
}
