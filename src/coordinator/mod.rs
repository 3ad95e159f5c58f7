//! The coordination core.
//!
//! [`JobCoordinator`] reconciles the desired set of ingestion jobs (one
//! per `(source, store)` pair implied by the registered stores and their
//! subscriptions) against the jobs the backend is actually running, and
//! mediates the spec-propagation protocol that pushes feature-set schema
//! changes to those jobs and collects their delivery acks.

pub mod runtime;

pub use runtime::CoordinatorRuntime;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::bus::{AckRecord, SpecPublisher};
use crate::config::CoordinatorConfig;
use crate::error::Result;
use crate::model::{
    DeliveryStatus, FeatureSet, FeatureSetRef, FeatureSetStatus, Job, JobKey, JobStatus, Source,
    Store,
};
use crate::registry::{FeatureSetFilter, SpecService, StoreFilter};
use crate::repository::{FeatureSetRepository, JobRepository, SourceRepository};
use crate::runner::JobManager;

/// One desired job: a store, a canonical source, and every feature set the
/// store's subscriptions matched for that source.
struct JobGroup {
    source: Source,
    store: Store,
    members: BTreeMap<FeatureSetRef, FeatureSet>,
}

impl JobGroup {
    fn member_refs(&self) -> Vec<FeatureSetRef> {
        self.members.keys().cloned().collect()
    }
}

pub struct JobCoordinator {
    spec_service: Arc<dyn SpecService>,
    sources: Arc<dyn SourceRepository>,
    feature_sets: Arc<dyn FeatureSetRepository>,
    jobs: Arc<dyn JobRepository>,
    job_manager: Arc<dyn JobManager>,
    publisher: Arc<dyn SpecPublisher>,
    job_update_timeout: Duration,
}

impl JobCoordinator {
    pub fn new(
        spec_service: Arc<dyn SpecService>,
        sources: Arc<dyn SourceRepository>,
        feature_sets: Arc<dyn FeatureSetRepository>,
        jobs: Arc<dyn JobRepository>,
        job_manager: Arc<dyn JobManager>,
        publisher: Arc<dyn SpecPublisher>,
        config: &CoordinatorConfig,
    ) -> Self {
        Self {
            spec_service,
            sources,
            feature_sets,
            jobs,
            job_manager,
            publisher,
            job_update_timeout: config.job_update_timeout(),
        }
    }

    /// One reconcile pass.
    ///
    /// Expands every store subscription into the feature sets it matches,
    /// collapses duplicate sources onto their canonical record, groups the
    /// `(feature set, store)` pairs by `(source, store)` job key, then per
    /// key either reuses the existing non-terminal job or starts a fresh
    /// one, aborting any surplus running jobs for the same key. Each pass
    /// is independent and idempotent: a converged state produces no runner
    /// calls and no new jobs.
    pub async fn poll(&self) -> Result<()> {
        let stores = self.spec_service.list_stores(&StoreFilter::default()).await?;
        if stores.is_empty() {
            tracing::debug!("no stores registered, nothing to reconcile");
            return Ok(());
        }

        let groups = self.desired_groups(stores).await?;
        if groups.is_empty() {
            tracing::debug!("no feature sets matched any store subscription");
            return Ok(());
        }

        // Snapshot of running jobs taken before this pass mutates anything;
        // a job started below is never treated as its own duplicate.
        let running_before = self.jobs.find_by_status(JobStatus::Running).await?;

        let mut batch: Vec<Job> = Vec::new();
        for (key, group) in groups {
            let existing = self.jobs.find_latest_non_terminal(&key).await?;
            let desired = match existing {
                Some(job) if job.serves_same_feature_sets(&group.member_refs()) => job,
                _ => self.start_group_job(&group).await?,
            };

            for surplus in running_before
                .iter()
                .filter(|j| j.key() == key && j.id != desired.id)
            {
                match tokio::time::timeout(
                    self.job_update_timeout,
                    self.job_manager.abort_job(surplus.clone()),
                )
                .await
                {
                    Ok(Ok(aborted)) => {
                        tracing::info!(
                            job_id = %aborted.id,
                            store = %aborted.store.name,
                            "aborted surplus ingestion job"
                        );
                        batch.push(aborted);
                    }
                    Ok(Err(e)) => {
                        tracing::warn!(
                            job_id = %surplus.id,
                            error = %e,
                            "failed to abort surplus job, will retry next pass"
                        );
                    }
                    Err(_) => {
                        tracing::warn!(
                            job_id = %surplus.id,
                            "abort timed out, will retry next pass"
                        );
                    }
                }
            }

            batch.push(desired);
        }

        self.jobs.save_all(batch).await?;
        Ok(())
    }

    /// Steps 1–4 of the pass: subscription expansion, source
    /// canonicalization, grouping by job key.
    async fn desired_groups(&self, stores: Vec<Store>) -> Result<BTreeMap<JobKey, JobGroup>> {
        let mut groups: BTreeMap<JobKey, JobGroup> = BTreeMap::new();

        for store in stores {
            // A feature set matching several subscriptions of one store
            // still counts once.
            let mut matched: BTreeMap<FeatureSetRef, FeatureSet> = BTreeMap::new();
            for subscription in &store.subscriptions {
                let filter = FeatureSetFilter::new(&subscription.project, &subscription.name);
                for feature_set in self.spec_service.list_feature_sets(&filter).await? {
                    matched.insert(feature_set.reference(), feature_set);
                }
            }

            for (reference, mut feature_set) in matched {
                let canonical = self
                    .sources
                    .find_canonical(feature_set.source.source_type, &feature_set.source.config)
                    .await?
                    .unwrap_or_else(|| feature_set.source.clone());
                feature_set.source = canonical.clone();

                let key = JobKey {
                    source_type: canonical.source_type,
                    source_config: canonical.config.clone(),
                    store_name: store.name.clone(),
                };
                groups
                    .entry(key)
                    .or_insert_with(|| JobGroup {
                        source: canonical,
                        store: store.clone(),
                        members: BTreeMap::new(),
                    })
                    .members
                    .insert(reference, feature_set);
            }
        }

        Ok(groups)
    }

    /// Step 5 for a group with no reusable job: build a fresh `PENDING`
    /// job, link every member feature set to it, and ask the runner to
    /// start it. A failed or timed-out start yields the job in `ERROR`; it
    /// is persisted anyway and replaced on the next pass.
    async fn start_group_job(&self, group: &JobGroup) -> Result<Job> {
        let job = Job::new(
            self.job_manager.runner_type(),
            group.source.clone(),
            group.store.clone(),
            group.member_refs(),
        );

        // Link each member so the next propagation pass pushes the current
        // spec to the new job.
        for feature_set in group.members.values() {
            let mut feature_set = feature_set.clone();
            feature_set.attach_job(&job.id);
            self.feature_sets.save(feature_set).await?;
        }

        tracing::info!(
            job_id = %job.id,
            source = %job.source.source_type,
            store = %job.store.name,
            feature_sets = job.feature_sets.len(),
            "starting ingestion job"
        );

        let started = match tokio::time::timeout(
            self.job_update_timeout,
            self.job_manager.start_job(job.clone()),
        )
        .await
        {
            Ok(Ok(started)) => started,
            Ok(Err(e)) => {
                tracing::error!(job_id = %job.id, error = %e, "failed to start ingestion job");
                let mut failed = job;
                failed.status = JobStatus::Error;
                failed
            }
            Err(_) => {
                tracing::error!(job_id = %job.id, "job start timed out");
                let mut failed = job;
                failed.status = JobStatus::Error;
                failed
            }
        };

        Ok(started)
    }

    /// One spec-propagation pass.
    ///
    /// For every `PENDING` feature set with at least one live job that has
    /// not seen the current version, publish the spec once (the ingestion
    /// side fans out by subscription) and move those links to
    /// `(current version, IN_PROGRESS)`. A failed publish leaves every
    /// link untouched; the next tick retries.
    pub async fn notify_jobs_when_feature_set_updated(&self) -> Result<()> {
        let pending = self
            .feature_sets
            .find_by_status(FeatureSetStatus::Pending)
            .await?;

        for mut feature_set in pending {
            let mut stale: Vec<usize> = Vec::new();
            for (idx, link) in feature_set.job_statuses.iter().enumerate() {
                if link.version == feature_set.version {
                    continue;
                }
                if self.job_is_terminal(&link.job_id).await? {
                    continue;
                }
                stale.push(idx);
            }
            if stale.is_empty() {
                continue;
            }

            let reference = feature_set.reference();
            match self
                .publisher
                .send(&reference.to_string(), feature_set.spec())
                .await
            {
                Ok(()) => {
                    for idx in stale {
                        let link = &mut feature_set.job_statuses[idx];
                        link.version = feature_set.version;
                        link.delivery_status = DeliveryStatus::InProgress;
                    }
                    tracing::info!(
                        feature_set = %reference,
                        version = feature_set.version,
                        "published feature set spec"
                    );
                    self.feature_sets.save(feature_set).await?;
                }
                Err(e) => {
                    tracing::warn!(
                        feature_set = %reference,
                        error = %e,
                        "spec publish failed, will retry next pass"
                    );
                }
            }
        }

        Ok(())
    }

    /// Process one ack-channel record.
    ///
    /// The record comes from a shared topic: a malformed key, an unknown
    /// feature set or job, an empty job name, a negative version, or a
    /// version other than the feature set's current one are all discarded
    /// without touching any state. A valid ack marks the link `DELIVERED`
    /// and, once every link owned by a live job has confirmed the current
    /// version, promotes the feature set to `READY`.
    pub async fn listen_ack_from_jobs(&self, record: &AckRecord) -> Result<()> {
        let Some(reference) = FeatureSetRef::parse(&record.key) else {
            tracing::debug!(key = %record.key, "discarding ack with malformed key");
            return Ok(());
        };

        let Some(mut feature_set) = self
            .feature_sets
            .find_by_reference(&reference.project, &reference.name)
            .await?
        else {
            tracing::debug!(feature_set = %reference, "discarding ack for unknown feature set");
            return Ok(());
        };

        let ack = &record.ack;
        if ack.job_name.is_empty() || ack.feature_set_version < 0 {
            tracing::debug!(feature_set = %reference, "discarding invalid ack");
            return Ok(());
        }
        if !feature_set
            .job_statuses
            .iter()
            .any(|l| l.job_id == ack.job_name)
        {
            tracing::debug!(
                feature_set = %reference,
                job_id = %ack.job_name,
                "discarding ack from unknown job"
            );
            return Ok(());
        }
        if ack.feature_set_version != feature_set.version {
            tracing::debug!(
                feature_set = %reference,
                acked = ack.feature_set_version,
                current = feature_set.version,
                "discarding stale ack"
            );
            return Ok(());
        }

        if let Some(link) = feature_set.link_mut(&ack.job_name) {
            link.delivery_status = DeliveryStatus::Delivered;
        }
        tracing::debug!(
            feature_set = %reference,
            job_id = %ack.job_name,
            version = feature_set.version,
            "spec delivery acknowledged"
        );

        if self.all_live_links_delivered(&feature_set).await? {
            feature_set.status = FeatureSetStatus::Ready;
            tracing::info!(
                feature_set = %reference,
                version = feature_set.version,
                "feature set ready"
            );
        }

        self.feature_sets.save(feature_set).await?;
        Ok(())
    }

    /// Promotion predicate: every link owned by a non-terminal job has
    /// confirmed the current version. Links of terminal or unknown jobs
    /// are ignored.
    async fn all_live_links_delivered(&self, feature_set: &FeatureSet) -> Result<bool> {
        for link in &feature_set.job_statuses {
            if self.job_is_terminal(&link.job_id).await? {
                continue;
            }
            if link.delivery_status != DeliveryStatus::Delivered
                || link.version != feature_set.version
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// A job missing from the repository counts as terminal.
    async fn job_is_terminal(&self, job_id: &str) -> Result<bool> {
        Ok(self
            .jobs
            .find_by_id(job_id)
            .await?
            .map(|j| j.status.is_terminal())
            .unwrap_or(true))
    }
}
