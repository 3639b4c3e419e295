//! Notification sink printing one JSON object per line to stdout.

use async_trait::async_trait;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::warn;
use tracker_core::Notification;
use tracker_types::{OutputSink, Settled, TxHash};

#[derive(Debug, Default)]
pub struct JsonLinesSink {
	written: AtomicUsize,
}

impl JsonLinesSink {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn written(&self) -> usize {
		self.written.load(Ordering::Relaxed)
	}

	fn emit(&self, notification: &Notification) {
		let line = match serde_json::to_string(notification) {
			Ok(line) => line,
			Err(e) => {
				warn!("Failed to encode notification: {}", e);
				return;
			}
		};

		let mut stdout = std::io::stdout().lock();
		if let Err(e) = writeln!(stdout, "{}", line) {
			warn!("Failed to write notification: {}", e);
			return;
		}
		self.written.fetch_add(1, Ordering::Relaxed);
	}
}

#[async_trait]
impl OutputSink for JsonLinesSink {
	async fn on_tx_settled(&self, tx: &TxHash, outcome: &Settled) {
		self.emit(&Notification::Settled {
			tx: tx.clone(),
			outcome: outcome.clone(),
		});
	}

	async fn on_tx_done(&self, tx: &TxHash, outcome: &Settled) {
		self.emit(&Notification::Done {
			tx: tx.clone(),
			outcome: outcome.clone(),
		});
	}
}
