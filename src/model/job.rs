use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::feature_set::FeatureSetRef;
use crate::model::source::{Source, SourceConfig, SourceType};
use crate::model::store::Store;

/// Backend a job executes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Runner {
    Direct,
    Dataflow,
    Flink,
}

impl std::fmt::Display for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Runner::Direct => write!(f, "direct"),
            Runner::Dataflow => write!(f, "dataflow"),
            Runner::Flink => write!(f, "flink"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    Running,
    Aborting,
    Aborted,
    Error,
    Completed,
}

impl JobStatus {
    /// Statuses from which no forward transition occurs.
    pub const TERMINAL: [JobStatus; 3] = [JobStatus::Aborted, JobStatus::Error, JobStatus::Completed];

    pub fn is_terminal(self) -> bool {
        Self::TERMINAL.contains(&self)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Pending => write!(f, "pending"),
            JobStatus::Running => write!(f, "running"),
            JobStatus::Aborting => write!(f, "aborting"),
            JobStatus::Aborted => write!(f, "aborted"),
            JobStatus::Error => write!(f, "error"),
            JobStatus::Completed => write!(f, "completed"),
        }
    }
}

/// Business key a job is deduplicated on: one non-terminal job may exist
/// per `(source type, source config, store name)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub source_type: SourceType,
    pub source_config: SourceConfig,
    pub store_name: String,
}

/// Execution handle for one ingestion job in the backend.
///
/// `id` is assigned by the coordinator; `ext_id` by the runner on start and
/// is empty until then. `feature_sets` mirrors the delivery links owned by
/// the member feature sets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub ext_id: String,
    pub runner: Runner,
    pub source: Source,
    pub store: Store,
    pub status: JobStatus,
    pub feature_sets: Vec<FeatureSetRef>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Job {
    pub fn new(runner: Runner, source: Source, store: Store, feature_sets: Vec<FeatureSetRef>) -> Self {
        let id = format!(
            "{}-to-{}-{}",
            source.source_type,
            store.name,
            &Uuid::new_v4().simple().to_string()[..8]
        );
        let now = Utc::now();
        Self {
            id,
            ext_id: String::new(),
            runner,
            source,
            store,
            status: JobStatus::Pending,
            feature_sets,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn key(&self) -> JobKey {
        JobKey {
            source_type: self.source.source_type,
            source_config: self.source.config.clone(),
            store_name: self.store.name.clone(),
        }
    }

    /// Whether this job serves exactly the given feature sets.
    pub fn serves_same_feature_sets(&self, refs: &[FeatureSetRef]) -> bool {
        if self.feature_sets.len() != refs.len() {
            return false;
        }
        refs.iter().all(|r| self.feature_sets.contains(r))
    }
}
