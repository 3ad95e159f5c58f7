use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Interval between reconcile passes.
    pub poll_interval_ms: u64,
    /// Interval between spec-propagation passes.
    pub notify_interval_ms: u64,
    /// Per-pass budget for a single runner call (start or abort).
    pub job_update_timeout_secs: u64,
    /// Topic feature-set specs are published to.
    pub spec_topic: String,
    /// Topic delivery acks are consumed from.
    pub ack_topic: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 10_000,
            notify_interval_ms: 5_000,
            job_update_timeout_secs: 5,
            spec_topic: "feature-set-specs".to_string(),
            ack_topic: "feature-set-spec-acks".to_string(),
        }
    }
}

impl CoordinatorConfig {
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    pub fn with_notify_interval_ms(mut self, ms: u64) -> Self {
        self.notify_interval_ms = ms;
        self
    }

    pub fn with_job_update_timeout_secs(mut self, secs: u64) -> Self {
        self.job_update_timeout_secs = secs;
        self
    }

    pub fn job_update_timeout(&self) -> Duration {
        Duration::from_secs(self.job_update_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn notify_interval(&self) -> Duration {
        Duration::from_millis(self.notify_interval_ms)
    }
}
