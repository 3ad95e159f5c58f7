//! Persistence contracts the coordinator depends on.
//!
//! The reconciler and the spec-propagation side only ever touch storage
//! through these traits; [`memory`] provides the in-process implementations
//! used by the binary's local mode and by tests.

pub mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{FeatureSet, FeatureSetStatus, Job, JobKey, JobStatus, Source, SourceConfig, SourceType};

#[async_trait]
pub trait SourceRepository: Send + Sync {
    /// The earliest-persisted source with the given business key, used to
    /// collapse duplicate in-memory records before grouping.
    async fn find_canonical(
        &self,
        source_type: SourceType,
        config: &SourceConfig,
    ) -> Result<Option<Source>>;
}

#[async_trait]
pub trait FeatureSetRepository: Send + Sync {
    /// Feature sets whose name and project match the given `LIKE`-style
    /// patterns (`%` matching any non-empty run of characters), ordered by
    /// name ascending.
    async fn find_all_matching(&self, name_like: &str, project_like: &str)
        -> Result<Vec<FeatureSet>>;

    async fn find_by_status(&self, status: FeatureSetStatus) -> Result<Vec<FeatureSet>>;

    async fn find_by_reference(&self, project: &str, name: &str) -> Result<Option<FeatureSet>>;

    /// Upsert one feature set, including its delivery links and status.
    async fn save(&self, feature_set: FeatureSet) -> Result<()>;
}

#[async_trait]
pub trait JobRepository: Send + Sync {
    /// The most-recently-updated job for the key whose status is not
    /// terminal, if any.
    async fn find_latest_non_terminal(&self, key: &JobKey) -> Result<Option<Job>>;

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Job>>;

    /// Atomic batch upsert; stamps `last_updated` on every job written.
    async fn save_all(&self, jobs: Vec<Job>) -> Result<()>;
}
