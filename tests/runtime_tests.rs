mod common;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;

use feature_coordinator::bus::{AckRecord, InMemoryBus};
use feature_coordinator::config::CoordinatorConfig;
use feature_coordinator::coordinator::{CoordinatorRuntime, JobCoordinator};
use feature_coordinator::model::{FeatureSetStatus, JobStatus, Source};
use feature_coordinator::registry::RegistryService;
use feature_coordinator::repository::memory::{
    InMemoryFeatureSetRepository, InMemoryJobRepository, InMemorySourceRepository,
};
use feature_coordinator::repository::FeatureSetRepository;

use common::{feature_set, redis_store, FakeJobManager};

/// Handle to a runtime spawned over in-memory backends.
struct RunningCoordinator {
    feature_sets: Arc<InMemoryFeatureSetRepository>,
    jobs: Arc<InMemoryJobRepository>,
    job_manager: Arc<FakeJobManager>,
    bus: Arc<InMemoryBus>,
    shutdown: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

/// Spin up the full runtime with fast ticks, one registered store, and one
/// pending feature set on one source.
async fn start_runtime() -> RunningCoordinator {
    let sources = Arc::new(InMemorySourceRepository::new());
    let feature_sets = Arc::new(InMemoryFeatureSetRepository::new());
    let jobs = Arc::new(InMemoryJobRepository::new());
    let registry = Arc::new(RegistryService::new(feature_sets.clone()));
    let job_manager = FakeJobManager::new();
    let (bus, ack_rx) = InMemoryBus::new(8);

    let source = Source::kafka(1, "servers:9092", "topic");
    sources.insert(source.clone()).await;
    feature_sets
        .insert(feature_set("project1", "features1", 1, &source))
        .await;
    registry
        .register_store(redis_store("test", &[("project1", "*")]))
        .await;

    let config = CoordinatorConfig::default()
        .with_poll_interval_ms(20)
        .with_notify_interval_ms(20);
    let coordinator = Arc::new(JobCoordinator::new(
        registry,
        sources,
        feature_sets.clone(),
        jobs.clone(),
        job_manager.clone(),
        bus.clone(),
        &config,
    ));

    let shutdown = CancellationToken::new();
    let runtime = CoordinatorRuntime::new(coordinator, config);
    let handle = tokio::spawn(runtime.run(ack_rx, shutdown.clone()));

    RunningCoordinator {
        feature_sets,
        jobs,
        job_manager,
        bus,
        shutdown,
        handle,
    }
}

#[tokio::test]
async fn test_runtime_reconciles_publishes_and_consumes_acks() {
    let rt = start_runtime().await;

    // The reconcile tick starts the job and the propagation tick publishes
    // the spec for it; wait for both loops to have done their work.
    let mut published = Vec::new();
    for _ in 0..200 {
        published = rt.bus.published().await;
        if !published.is_empty() && !rt.jobs.all().await.is_empty() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert!(!published.is_empty(), "spec was never published");
    assert_eq!(published[0].key, "project1/features1");
    assert_eq!(published[0].spec.version, 1);

    let jobs = rt.jobs.all().await;
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].status, JobStatus::Running);

    // Ack through the bus's real channel; the consume loop picks it up and
    // promotes the feature set.
    rt.bus
        .ack(AckRecord::new("project1/features1", 1, &jobs[0].id))
        .await
        .unwrap();

    let mut status = FeatureSetStatus::Pending;
    for _ in 0..200 {
        status = rt
            .feature_sets
            .find_by_reference("project1", "features1")
            .await
            .unwrap()
            .unwrap()
            .status;
        if status == FeatureSetStatus::Ready {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(status, FeatureSetStatus::Ready);

    // A converged runtime shuts down cleanly.
    rt.shutdown.cancel();
    timeout(Duration::from_secs(5), rt.handle)
        .await
        .expect("runtime did not stop after cancellation")
        .unwrap();
}

#[tokio::test]
async fn test_cancellation_stops_both_periodic_loops() {
    let rt = start_runtime().await;

    // Let a few ticks fire, then cancel. `run` only returns once the
    // reconcile and notify tasks have been joined.
    sleep(Duration::from_millis(60)).await;
    rt.shutdown.cancel();
    timeout(Duration::from_secs(5), rt.handle)
        .await
        .expect("runtime did not stop after cancellation")
        .unwrap();

    // No loop is left behind: runner call counts stay frozen.
    let started_after_stop = rt.job_manager.started().len();
    let aborted_after_stop = rt.job_manager.aborted().len();
    sleep(Duration::from_millis(100)).await;
    assert_eq!(rt.job_manager.started().len(), started_after_stop);
    assert_eq!(rt.job_manager.aborted().len(), aborted_after_stop);
}
