pub mod direct;

pub use direct::DirectJobManager;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Job, JobStatus, Runner};

/// Capability surface the reconciler needs from a job-execution backend.
/// Dispatch over runner variants lives behind this trait, never in the
/// reconciler.
#[async_trait]
pub trait JobManager: Send + Sync {
    /// Runner variant stamped onto jobs this manager starts.
    fn runner_type(&self) -> Runner;

    /// Launch a job. Expects `status == PENDING` and an empty `ext_id`;
    /// returns the job with `ext_id` populated and `status == RUNNING`, or
    /// with `status == ERROR` if the backend rejected it. Must be
    /// idempotent per job id: retrying a started job may not spawn a second
    /// external job.
    async fn start_job(&self, job: Job) -> Result<Job>;

    /// Abort a non-terminal job. Returns the job in `ABORTING` or
    /// `ABORTED`; the backend eventually drives it to `ABORTED`.
    async fn abort_job(&self, job: Job) -> Result<Job>;

    /// Observe the backend's view of a job's status.
    async fn get_job_status(&self, job: &Job) -> Result<JobStatus>;
}
