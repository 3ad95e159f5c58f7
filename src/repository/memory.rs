//! In-memory repository implementations.
//!
//! Backing storage for the binary's local mode and for tests. Query
//! semantics match what a SQL-backed implementation would produce: `LIKE`
//! matching with `%` wildcards, name-ascending ordering, id-ascending
//! canonical source resolution.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{FeatureSet, FeatureSetStatus, Job, JobKey, JobStatus, Source, SourceConfig, SourceType};
use crate::repository::{FeatureSetRepository, JobRepository, SourceRepository};

/// `LIKE`-style match where `%` stands for any non-empty run of
/// characters, mirroring the `*` glob it is translated from.
fn like_match(pattern: &str, value: &str) -> bool {
    if !pattern.contains('%') {
        return pattern == value;
    }
    let segments: Vec<&str> = pattern.split('%').collect();
    let last = segments.len() - 1;

    let mut rest = value;
    if !rest.starts_with(segments[0]) {
        return false;
    }
    rest = &rest[segments[0].len()..];

    // Each wildcard has to swallow at least one character.
    for segment in &segments[1..last] {
        let Some(first) = rest.chars().next() else {
            return false;
        };
        let tail = &rest[first.len_utf8()..];
        match tail.find(segment) {
            Some(pos) => rest = &tail[pos + segment.len()..],
            None => return false,
        }
    }

    rest.len() > segments[last].len() && rest.ends_with(segments[last])
}

#[derive(Debug, Default)]
pub struct InMemorySourceRepository {
    sources: RwLock<Vec<Source>>,
}

impl InMemorySourceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, source: Source) {
        self.sources.write().await.push(source);
    }
}

#[async_trait]
impl SourceRepository for InMemorySourceRepository {
    async fn find_canonical(
        &self,
        source_type: SourceType,
        config: &SourceConfig,
    ) -> Result<Option<Source>> {
        let sources = self.sources.read().await;
        Ok(sources
            .iter()
            .filter(|s| s.source_type == source_type && &s.config == config)
            .min_by_key(|s| s.id)
            .cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryFeatureSetRepository {
    // keyed by (project, name)
    sets: RwLock<HashMap<(String, String), FeatureSet>>,
}

impl InMemoryFeatureSetRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, feature_set: FeatureSet) {
        let key = (feature_set.project.clone(), feature_set.name.clone());
        self.sets.write().await.insert(key, feature_set);
    }
}

#[async_trait]
impl FeatureSetRepository for InMemoryFeatureSetRepository {
    async fn find_all_matching(
        &self,
        name_like: &str,
        project_like: &str,
    ) -> Result<Vec<FeatureSet>> {
        let sets = self.sets.read().await;
        let mut matched: Vec<FeatureSet> = sets
            .values()
            .filter(|fs| like_match(name_like, &fs.name) && like_match(project_like, &fs.project))
            .cloned()
            .collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn find_by_status(&self, status: FeatureSetStatus) -> Result<Vec<FeatureSet>> {
        let sets = self.sets.read().await;
        let mut matched: Vec<FeatureSet> =
            sets.values().filter(|fs| fs.status == status).cloned().collect();
        matched.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(matched)
    }

    async fn find_by_reference(&self, project: &str, name: &str) -> Result<Option<FeatureSet>> {
        let sets = self.sets.read().await;
        Ok(sets.get(&(project.to_string(), name.to_string())).cloned())
    }

    async fn save(&self, feature_set: FeatureSet) -> Result<()> {
        let key = (feature_set.project.clone(), feature_set.name.clone());
        self.sets.write().await.insert(key, feature_set);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryJobRepository {
    jobs: RwLock<HashMap<String, Job>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job as-is, preserving its `last_updated` stamp. Seeding
    /// only; the coordinator always goes through [`JobRepository::save_all`].
    pub async fn insert(&self, job: Job) {
        self.jobs.write().await.insert(job.id.clone(), job);
    }

    pub async fn all(&self) -> Vec<Job> {
        let jobs = self.jobs.read().await;
        let mut all: Vec<Job> = jobs.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn find_latest_non_terminal(&self, key: &JobKey) -> Result<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs
            .values()
            .filter(|j| !j.status.is_terminal() && &j.key() == key)
            .max_by_key(|j| j.last_updated)
            .cloned())
    }

    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<Job>> {
        let jobs = self.jobs.read().await;
        let mut matched: Vec<Job> = jobs.values().filter(|j| j.status == status).cloned().collect();
        matched.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(matched)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Job>> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(id).cloned())
    }

    async fn save_all(&self, batch: Vec<Job>) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let now = Utc::now();
        for mut job in batch {
            job.last_updated = now;
            jobs.insert(job.id.clone(), job);
        }
        Ok(())
    }
}
