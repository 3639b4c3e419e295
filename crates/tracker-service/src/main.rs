use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracker_config::{ConfigLoader, TrackerConfig};
use tracker_core::{ChainCall, TrackerService, TxTracker};
use tracker_monitoring::{init_tracing, TrackerMetrics, TracingConfig};

mod scenario;
mod sink;

use scenario::Scenario;
use sink::JsonLinesSink;

#[derive(Parser)]
#[command(name = "tx-tracker")]
#[command(about = "Transaction lifecycle tracker", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Commands,

	#[arg(short, long, value_name = "FILE")]
	config: Option<PathBuf>,

	/// Overrides the configured log level
	#[arg(long)]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Replay a recorded scenario and print notifications as JSON lines
	Replay {
		#[arg(value_name = "SCENARIO")]
		scenario: PathBuf,
	},
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let mut config = load_config(&cli).await?;
	if let Some(level) = &cli.log_level {
		config.logging.level = level.clone();
	}
	setup_tracing(&config)?;

	match cli.command {
		Commands::Replay { scenario } => replay(config, scenario).await,
		Commands::Validate => validate(config),
	}
}

async fn load_config(cli: &Cli) -> Result<TrackerConfig> {
	let mut loader = ConfigLoader::new();
	if let Some(path) = &cli.config {
		loader = loader.with_file(path);
	}

	loader.load().await.context("Failed to load configuration")
}

fn setup_tracing(config: &TrackerConfig) -> Result<()> {
	let level = tracker_config::log_level(config)?;
	let tracing_config = TracingConfig::new()
		.with_level(level)
		.with_format(config.log_format());

	init_tracing(tracing_config).map_err(|e| anyhow::anyhow!("{}", e))
}

async fn replay(config: TrackerConfig, path: PathBuf) -> Result<()> {
	info!("Replaying scenario {:?} with {}", path, config.tracker.name);

	let (chain, events) = Scenario::load(&path).await?.into_parts();
	let chain = Arc::new(chain);
	let sink = Arc::new(JsonLinesSink::new());
	let metrics = Arc::new(TrackerMetrics::new());

	let tracker = TxTracker::with_metrics(chain.clone(), sink.clone(), metrics.clone());
	let (service, handle) = TrackerService::new(tracker, config.tracker.event_channel_capacity);
	let worker = tokio::spawn(service.run());

	for event in events {
		handle.send(event).await?;
	}
	drop(handle);

	let tracker = worker.await.context("Tracker event loop panicked")?;

	for call in chain.calls().await {
		if let ChainCall::Unpin { block_hashes } = call {
			info!("unpin {:?}", block_hashes);
		}
	}

	let pending = tracker.pending();
	if !pending.is_empty() {
		info!("{} transactions still pending: {:?}", pending.len(), pending);
	}
	info!(
		"Replay finished: {} notifications, metrics {}",
		sink.written(),
		serde_json::to_string(&metrics.snapshot())?
	);

	Ok(())
}

fn validate(config: TrackerConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("Tracker name: {}", config.tracker.name);
	info!(
		"Event channel capacity: {}",
		config.tracker.event_channel_capacity
	);
	info!(
		"Logging: level={} format={}",
		config.logging.level, config.logging.format
	);

	Ok(())
}
