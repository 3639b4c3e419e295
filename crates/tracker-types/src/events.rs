//! Chain events consumed by the tracker.

use crate::common::{BlockHash, TxHash};
use serde::{Deserialize, Serialize};

/// A single event from the chain event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TrackerEvent {
	/// A transaction was submitted and should be tracked.
	NewTransaction { value: TxHash },
	/// A block was announced.
	#[serde(rename_all = "camelCase")]
	NewBlock {
		block_hash: BlockHash,
		#[serde(default)]
		parent: Option<BlockHash>,
	},
	/// A block was finalized. Not emitted for every finalized block.
	#[serde(rename_all = "camelCase")]
	Finalized { block_hash: BlockHash },
}

impl TrackerEvent {
	pub fn new_transaction(value: impl Into<TxHash>) -> Self {
		TrackerEvent::NewTransaction {
			value: value.into(),
		}
	}

	pub fn new_block(block_hash: impl Into<BlockHash>, parent: Option<&str>) -> Self {
		TrackerEvent::NewBlock {
			block_hash: block_hash.into(),
			parent: parent.map(BlockHash::from),
		}
	}

	pub fn finalized(block_hash: impl Into<BlockHash>) -> Self {
		TrackerEvent::Finalized {
			block_hash: block_hash.into(),
		}
	}

	/// Short name used in logs and metrics.
	pub fn kind(&self) -> &'static str {
		match self {
			TrackerEvent::NewTransaction { .. } => "newTransaction",
			TrackerEvent::NewBlock { .. } => "newBlock",
			TrackerEvent::Finalized { .. } => "finalized",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_event_stream_format() {
		let events: Vec<TrackerEvent> = serde_json::from_str(
			r#"[
				{"type": "newTransaction", "value": "A"},
				{"type": "newBlock", "blockHash": "X"},
				{"type": "newBlock", "blockHash": "Y", "parent": "X"},
				{"type": "finalized", "blockHash": "Y"}
			]"#,
		)
		.unwrap();

		assert_eq!(
			events,
			vec![
				TrackerEvent::new_transaction("A"),
				TrackerEvent::new_block("X", None),
				TrackerEvent::new_block("Y", Some("X")),
				TrackerEvent::finalized("Y"),
			]
		);
		assert_eq!(events[1].kind(), "newBlock");
	}
}
