//! Recorded scenarios for the `replay` command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracker_core::{BlockRecord, InMemoryChain};
use tracker_types::{BlockHash, TrackerEvent};

/// Chain contents plus the event stream to feed the tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
	#[serde(default)]
	pub blocks: HashMap<BlockHash, BlockRecord>,
	pub events: Vec<TrackerEvent>,
}

impl Scenario {
	pub async fn load(path: &Path) -> Result<Self> {
		let content = tokio::fs::read_to_string(path)
			.await
			.with_context(|| format!("Failed to read scenario file: {:?}", path))?;

		Self::from_json(&content)
	}

	pub fn from_json(content: &str) -> Result<Self> {
		serde_json::from_str(content).context("Failed to parse scenario JSON")
	}

	/// Splits the scenario into the chain it runs against and its events.
	pub fn into_parts(self) -> (InMemoryChain, Vec<TrackerEvent>) {
		(InMemoryChain::from_blocks(self.blocks), self.events)
	}
}
