use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CoordinatorError, Result};
use crate::model::{Job, JobStatus, Runner};
use crate::runner::JobManager;

/// In-process runner for local and dev deployments.
///
/// Does not ingest anything; it models the backend's lifecycle so the
/// coordinator can be exercised end to end. Started jobs are tracked by
/// coordinator id, which is what makes retries idempotent.
#[derive(Debug, Default)]
pub struct DirectJobManager {
    // job id -> (ext id, status)
    jobs: RwLock<HashMap<String, (String, JobStatus)>>,
}

impl DirectJobManager {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobManager for DirectJobManager {
    fn runner_type(&self) -> Runner {
        Runner::Direct
    }

    async fn start_job(&self, mut job: Job) -> Result<Job> {
        if job.status != JobStatus::Pending {
            return Err(CoordinatorError::Runner(format!(
                "job {} is {}, expected pending",
                job.id, job.status
            )));
        }

        let mut jobs = self.jobs.write().await;
        let (ext_id, status) = jobs
            .entry(job.id.clone())
            .or_insert_with(|| {
                let ext_id = format!("direct-{}", Uuid::new_v4().simple());
                tracing::info!(job_id = %job.id, ext_id = %ext_id, "started direct job");
                (ext_id, JobStatus::Running)
            })
            .clone();

        job.ext_id = ext_id;
        job.status = status;
        Ok(job)
    }

    async fn abort_job(&self, mut job: Job) -> Result<Job> {
        if job.status.is_terminal() {
            return Err(CoordinatorError::Runner(format!(
                "job {} is already {}",
                job.id, job.status
            )));
        }

        let mut jobs = self.jobs.write().await;
        jobs.insert(job.id.clone(), (job.ext_id.clone(), JobStatus::Aborted));
        tracing::info!(job_id = %job.id, "aborted direct job");

        job.status = JobStatus::Aborted;
        Ok(job)
    }

    async fn get_job_status(&self, job: &Job) -> Result<JobStatus> {
        let jobs = self.jobs.read().await;
        Ok(jobs.get(&job.id).map(|(_, status)| *status).unwrap_or(job.status))
    }
}
