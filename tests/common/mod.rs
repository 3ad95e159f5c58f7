//! Shared fixtures for coordinator integration tests: in-memory backends,
//! a scripted runner, and a fault-injecting publisher.

// Each test binary uses its own slice of these helpers.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use feature_coordinator::bus::SpecPublisher;
use feature_coordinator::config::CoordinatorConfig;
use feature_coordinator::coordinator::JobCoordinator;
use feature_coordinator::error::{CoordinatorError, Result};
use feature_coordinator::model::{
    DeliveryStatus, FeatureSet, FeatureSetJobStatus, FeatureSetRef, FeatureSetSpec, Job, JobStatus,
    Runner, Source, Store, StoreConfig, Subscription,
};
use feature_coordinator::registry::RegistryService;
use feature_coordinator::repository::memory::{
    InMemoryFeatureSetRepository, InMemoryJobRepository, InMemorySourceRepository,
};
use feature_coordinator::runner::JobManager;

/// Runner double recording every call. Started jobs get sequential
/// external ids (`extid1`, `extid2`, ...); failure modes are switchable
/// per test.
#[derive(Debug, Default)]
pub struct FakeJobManager {
    started: Mutex<Vec<Job>>,
    aborted: Mutex<Vec<Job>>,
    ext_seq: AtomicUsize,
    fail_start: AtomicBool,
    fail_abort: AtomicBool,
}

impl FakeJobManager {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.fail_start.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_abort(&self, fail: bool) {
        self.fail_abort.store(fail, Ordering::SeqCst);
    }

    pub fn started(&self) -> Vec<Job> {
        self.started.lock().unwrap().clone()
    }

    pub fn aborted(&self) -> Vec<Job> {
        self.aborted.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobManager for FakeJobManager {
    fn runner_type(&self) -> Runner {
        Runner::Dataflow
    }

    async fn start_job(&self, mut job: Job) -> Result<Job> {
        self.started.lock().unwrap().push(job.clone());
        if self.fail_start.load(Ordering::SeqCst) {
            job.status = JobStatus::Error;
            return Ok(job);
        }
        let n = self.ext_seq.fetch_add(1, Ordering::SeqCst) + 1;
        job.ext_id = format!("extid{n}");
        job.status = JobStatus::Running;
        Ok(job)
    }

    async fn abort_job(&self, mut job: Job) -> Result<Job> {
        if self.fail_abort.load(Ordering::SeqCst) {
            return Err(CoordinatorError::Runner("abort rejected".to_string()));
        }
        self.aborted.lock().unwrap().push(job.clone());
        job.status = JobStatus::Aborted;
        Ok(job)
    }

    async fn get_job_status(&self, job: &Job) -> Result<JobStatus> {
        Ok(job.status)
    }
}

/// Publisher double recording successful sends; can simulate a broker
/// outage.
#[derive(Debug, Default)]
pub struct FakePublisher {
    sent: Mutex<Vec<(String, FeatureSetSpec)>>,
    attempts: AtomicUsize,
    fail: AtomicBool,
}

impl FakePublisher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, FeatureSetSpec)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpecPublisher for FakePublisher {
    async fn send(&self, key: &str, spec: FeatureSetSpec) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CoordinatorError::Publish("broker unavailable".to_string()));
        }
        self.sent.lock().unwrap().push((key.to_string(), spec));
        Ok(())
    }
}

/// Everything a coordinator test needs, wired together.
pub struct TestContext {
    pub sources: Arc<InMemorySourceRepository>,
    pub feature_sets: Arc<InMemoryFeatureSetRepository>,
    pub jobs: Arc<InMemoryJobRepository>,
    pub registry: Arc<RegistryService>,
    pub job_manager: Arc<FakeJobManager>,
    pub publisher: Arc<FakePublisher>,
    pub coordinator: JobCoordinator,
}

impl TestContext {
    pub fn new() -> Self {
        let sources = Arc::new(InMemorySourceRepository::new());
        let feature_sets = Arc::new(InMemoryFeatureSetRepository::new());
        let jobs = Arc::new(InMemoryJobRepository::new());
        let registry = Arc::new(RegistryService::new(feature_sets.clone()));
        let job_manager = FakeJobManager::new();
        let publisher = FakePublisher::new();

        let coordinator = JobCoordinator::new(
            registry.clone(),
            sources.clone(),
            feature_sets.clone(),
            jobs.clone(),
            job_manager.clone(),
            publisher.clone(),
            &CoordinatorConfig::default(),
        );

        Self {
            sources,
            feature_sets,
            jobs,
            registry,
            job_manager,
            publisher,
            coordinator,
        }
    }
}

pub fn redis_store(name: &str, subscriptions: &[(&str, &str)]) -> Store {
    Store::new(
        name,
        StoreConfig::Redis {
            host: "localhost".to_string(),
            port: 6379,
        },
        subscriptions
            .iter()
            .map(|(project, fs_name)| Subscription::new(project, fs_name))
            .collect(),
    )
}

pub fn feature_set(project: &str, name: &str, version: i32, source: &Source) -> FeatureSet {
    FeatureSet::new(project, name, version, source.clone())
}

pub fn link(job_id: &str, version: i32, delivery_status: DeliveryStatus) -> FeatureSetJobStatus {
    FeatureSetJobStatus {
        job_id: job_id.to_string(),
        version,
        delivery_status,
    }
}

/// Build a job in a given state, bypassing the runner.
pub fn job_with(
    id: &str,
    status: JobStatus,
    source: &Source,
    store: &Store,
    feature_sets: &[FeatureSetRef],
) -> Job {
    let mut job = Job::new(
        Runner::Dataflow,
        source.clone(),
        store.clone(),
        feature_sets.to_vec(),
    );
    job.id = id.to_string();
    job.ext_id = format!("ext-{id}");
    job.status = status;
    job
}
