//! Event loop around a [`TxTracker`].
//!
//! Producers push events through a [`TrackerHandle`]; the service handles
//! them strictly one at a time, so no two events ever interleave.

use crate::tracker::TxTracker;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info};
use tracker_types::{ChainData, OutputSink, TrackerError, TrackerEvent};

/// Producer side of a [`TrackerService`].
#[derive(Clone)]
pub struct TrackerHandle {
	events: mpsc::Sender<TrackerEvent>,
	shutdown: broadcast::Sender<()>,
}

impl TrackerHandle {
	/// Enqueues an event, waiting for channel capacity.
	pub async fn send(&self, event: TrackerEvent) -> Result<(), TrackerError> {
		self.events
			.send(event)
			.await
			.map_err(|_| TrackerError::ChannelClosed)
	}

	/// Stops the service after the event currently being handled.
	pub fn shutdown(&self) -> Result<(), TrackerError> {
		self.shutdown
			.send(())
			.map(|_| ())
			.map_err(|e| TrackerError::Shutdown(e.to_string()))
	}
}

enum Next {
	Event(TrackerEvent),
	Drain,
	Stop,
}

pub struct TrackerService<C, S> {
	tracker: TxTracker<C, S>,
	events: mpsc::Receiver<TrackerEvent>,
	shutdown: broadcast::Receiver<()>,
}

impl<C: ChainData, S: OutputSink> TrackerService<C, S> {
	pub fn new(tracker: TxTracker<C, S>, capacity: usize) -> (Self, TrackerHandle) {
		let (events_tx, events_rx) = mpsc::channel(capacity);
		let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

		let service = Self {
			tracker,
			events: events_rx,
			shutdown: shutdown_rx,
		};
		let handle = TrackerHandle {
			events: events_tx,
			shutdown: shutdown_tx,
		};
		(service, handle)
	}

	/// Runs until shutdown is requested or every handle is dropped, then
	/// hands the tracker back.
	pub async fn run(mut self) -> TxTracker<C, S> {
		info!("Starting tracker event loop");

		loop {
			let next = tokio::select! {
				biased;
				signal = self.shutdown.recv() => match signal {
					Err(broadcast::error::RecvError::Closed) => Next::Drain,
					_ => Next::Stop,
				},
				event = self.events.recv() => match event {
					Some(event) => Next::Event(event),
					None => Next::Stop,
				},
			};

			match next {
				Next::Event(event) => self.process(event).await,
				Next::Drain => {
					debug!("All handles dropped, draining buffered events");
					while let Some(event) = self.events.recv().await {
						self.process(event).await;
					}
					break;
				}
				Next::Stop => break,
			}
		}

		info!("Tracker event loop stopped");
		self.tracker
	}

	async fn process(&mut self, event: TrackerEvent) {
		let kind = event.kind();
		if let Err(e) = self.tracker.handle(event).await {
			error!("Failed to handle {} event: {}", kind, e);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::{BlockRecord, InMemoryChain, Notification, RecordingSink};
	use std::sync::Arc;
	use tracker_types::{BlockHash, Settled, TxHash};

	fn service(
		chain: InMemoryChain,
	) -> (
		TrackerService<Arc<InMemoryChain>, Arc<RecordingSink>>,
		TrackerHandle,
		Arc<RecordingSink>,
	) {
		let sink = Arc::new(RecordingSink::new());
		let tracker = TxTracker::new(Arc::new(chain), sink.clone());
		let (service, handle) = TrackerService::new(tracker, 4);
		(service, handle, sink)
	}

	#[tokio::test]
	async fn test_drains_events_after_handles_drop() {
		let chain = InMemoryChain::new().with_block("b1", BlockRecord::new().with_body(["t1"]));
		let (service, handle, sink) = service(chain);
		let worker = tokio::spawn(service.run());

		handle.send(TrackerEvent::new_transaction("t1")).await.unwrap();
		handle.send(TrackerEvent::new_block("b1", None)).await.unwrap();
		handle.send(TrackerEvent::finalized("b1")).await.unwrap();
		drop(handle);

		let tracker = worker.await.unwrap();
		assert!(tracker.is_done(&TxHash::from("t1")));
		assert_eq!(
			sink.notifications().await,
			vec![
				Notification::Settled {
					tx: TxHash::from("t1"),
					outcome: Settled::valid(BlockHash::from("b1"), true),
				},
				Notification::Done {
					tx: TxHash::from("t1"),
					outcome: Settled::valid(BlockHash::from("b1"), true),
				},
			]
		);
		assert_eq!(tracker.metrics().snapshot().events, 3);
	}

	#[tokio::test]
	async fn test_failed_event_does_not_stop_the_loop() {
		// "missing" is not a known block, so its validity query fails.
		let chain = InMemoryChain::new().with_block("b1", BlockRecord::new().with_body(["t1"]));
		let (service, handle, sink) = service(chain);
		let worker = tokio::spawn(service.run());

		handle.send(TrackerEvent::new_transaction("t1")).await.unwrap();
		handle
			.send(TrackerEvent::new_block("missing", None))
			.await
			.unwrap();
		handle
			.send(TrackerEvent::new_block("b1", Some("missing")))
			.await
			.unwrap();
		drop(handle);

		let tracker = worker.await.unwrap();
		assert_eq!(sink.notifications().await.len(), 1);
		assert!(tracker.pending().is_empty());
	}

	#[tokio::test]
	async fn test_shutdown_stops_the_loop() {
		let (service, handle, _sink) = service(InMemoryChain::new());
		let worker = tokio::spawn(service.run());

		handle.shutdown().unwrap();
		let tracker = worker.await.unwrap();

		assert!(tracker.tracked_blocks().is_empty());
		assert!(matches!(
			handle.send(TrackerEvent::new_transaction("late")).await,
			Err(TrackerError::ChannelClosed)
		));
	}
}
