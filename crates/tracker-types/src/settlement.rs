//! Settlement outcomes.

use crate::common::BlockHash;
use serde::{Deserialize, Serialize};

/// Fate of a transaction in the block it settled in.
///
/// The same value is handed to `on_tx_settled` and later to `on_tx_done`,
/// so it carries the settling block alongside the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Settled {
	/// Rejected in the context of this block.
	#[serde(rename_all = "camelCase")]
	Invalid { block_hash: BlockHash },
	/// Included and executed in this block.
	#[serde(rename_all = "camelCase")]
	Valid {
		block_hash: BlockHash,
		successful: bool,
	},
}

impl Settled {
	pub fn invalid(block_hash: BlockHash) -> Self {
		Settled::Invalid { block_hash }
	}

	pub fn valid(block_hash: BlockHash, successful: bool) -> Self {
		Settled::Valid {
			block_hash,
			successful,
		}
	}

	/// Block the transaction settled in.
	pub fn block_hash(&self) -> &BlockHash {
		match self {
			Settled::Invalid { block_hash } | Settled::Valid { block_hash, .. } => block_hash,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_settled_wire_shape() {
		let valid = Settled::valid(BlockHash::from("0xb1"), true);
		let json = serde_json::to_value(&valid).unwrap();
		assert_eq!(
			json,
			serde_json::json!({"type": "valid", "blockHash": "0xb1", "successful": true})
		);

		let invalid: Settled =
			serde_json::from_str(r#"{"type":"invalid","blockHash":"0xb2"}"#).unwrap();
		assert_eq!(invalid, Settled::invalid(BlockHash::from("0xb2")));
		assert_eq!(invalid.block_hash().as_str(), "0xb2");
	}
}
