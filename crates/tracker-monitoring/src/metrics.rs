//! Tracker counters.
//!
//! Every counter is exact: it is bumped once per call the tracker actually
//! makes, so a snapshot doubles as an audit of query minimisation.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared between the tracker and whoever reports on it.
#[derive(Debug, Default)]
pub struct TrackerMetrics {
	events: AtomicU64,
	settled: AtomicU64,
	done: AtomicU64,
	body_fetches: AtomicU64,
	validity_queries: AtomicU64,
	success_queries: AtomicU64,
	unpinned: AtomicU64,
}

/// Point-in-time copy of [`TrackerMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
	pub events: u64,
	pub settled: u64,
	pub done: u64,
	pub body_fetches: u64,
	pub validity_queries: u64,
	pub success_queries: u64,
	pub unpinned: u64,
}

impl TrackerMetrics {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record_event(&self) {
		self.events.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_settled(&self) {
		self.settled.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_done(&self) {
		self.done.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_body_fetch(&self) {
		self.body_fetches.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_validity_query(&self) {
		self.validity_queries.fetch_add(1, Ordering::Relaxed);
	}

	pub fn record_success_query(&self) {
		self.success_queries.fetch_add(1, Ordering::Relaxed);
	}

	/// Counts blocks, not `unpin` calls.
	pub fn record_unpinned(&self, blocks: usize) {
		self.unpinned.fetch_add(blocks as u64, Ordering::Relaxed);
	}

	pub fn snapshot(&self) -> MetricsSnapshot {
		MetricsSnapshot {
			events: self.events.load(Ordering::Relaxed),
			settled: self.settled.load(Ordering::Relaxed),
			done: self.done.load(Ordering::Relaxed),
			body_fetches: self.body_fetches.load(Ordering::Relaxed),
			validity_queries: self.validity_queries.load(Ordering::Relaxed),
			success_queries: self.success_queries.load(Ordering::Relaxed),
			unpinned: self.unpinned.load(Ordering::Relaxed),
		}
	}
}
