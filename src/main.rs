use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use feature_coordinator::bus::InMemoryBus;
use feature_coordinator::config::CoordinatorConfig;
use feature_coordinator::coordinator::{CoordinatorRuntime, JobCoordinator};
use feature_coordinator::error::CoordinatorError;
use feature_coordinator::model::{FeatureSet, Source, Store};
use feature_coordinator::registry::RegistryService;
use feature_coordinator::repository::memory::{
    InMemoryFeatureSetRepository, InMemoryJobRepository, InMemorySourceRepository,
};
use feature_coordinator::runner::DirectJobManager;
use feature_coordinator::shutdown::install_shutdown_handler;

#[derive(Parser, Debug)]
#[command(name = "feature-coordinator")]
#[command(about = "Job coordinator for a feature-ingestion platform")]
struct Args {
    /// JSON file with stores, sources, and feature sets to register
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Interval between reconcile passes in milliseconds
    #[arg(long, default_value = "10000")]
    poll_interval_ms: u64,

    /// Interval between spec-propagation passes in milliseconds
    #[arg(long, default_value = "5000")]
    notify_interval_ms: u64,

    /// Per-pass budget for a single runner call in seconds
    #[arg(long, default_value = "5")]
    job_update_timeout_secs: u64,
}

/// Declarative registry contents for local mode.
#[derive(Debug, Deserialize)]
struct RegistrySeed {
    #[serde(default)]
    stores: Vec<Store>,
    #[serde(default)]
    sources: Vec<Source>,
    #[serde(default)]
    feature_sets: Vec<FeatureSet>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = CoordinatorConfig::default()
        .with_poll_interval_ms(args.poll_interval_ms)
        .with_notify_interval_ms(args.notify_interval_ms)
        .with_job_update_timeout_secs(args.job_update_timeout_secs);

    let sources = Arc::new(InMemorySourceRepository::new());
    let feature_sets = Arc::new(InMemoryFeatureSetRepository::new());
    let jobs = Arc::new(InMemoryJobRepository::new());
    let registry = Arc::new(RegistryService::new(feature_sets.clone()));

    if let Some(path) = &args.registry {
        let raw = std::fs::read_to_string(path)?;
        let seed: RegistrySeed = serde_json::from_str(&raw).map_err(CoordinatorError::Seed)?;
        tracing::info!(
            stores = seed.stores.len(),
            sources = seed.sources.len(),
            feature_sets = seed.feature_sets.len(),
            registry = %path.display(),
            "loading registry seed"
        );
        for source in seed.sources {
            sources.insert(source).await;
        }
        for feature_set in seed.feature_sets {
            feature_sets.insert(feature_set).await;
        }
        for store in seed.stores {
            registry.register_store(store).await;
        }
    }

    let (bus, ack_rx) = InMemoryBus::new(64);
    let job_manager = Arc::new(DirectJobManager::new());

    let coordinator = Arc::new(JobCoordinator::new(
        registry,
        sources,
        feature_sets,
        jobs,
        job_manager,
        bus,
        &config,
    ));

    tracing::info!(
        poll_interval_ms = config.poll_interval_ms,
        notify_interval_ms = config.notify_interval_ms,
        job_update_timeout_secs = config.job_update_timeout_secs,
        spec_topic = %config.spec_topic,
        ack_topic = %config.ack_topic,
        "starting feature coordinator"
    );

    let shutdown = install_shutdown_handler();
    CoordinatorRuntime::new(coordinator, config)
        .run(ack_rx, shutdown)
        .await;

    Ok(())
}
