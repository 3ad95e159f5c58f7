use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::bus::AckRecord;
use crate::config::CoordinatorConfig;
use crate::coordinator::JobCoordinator;

/// Periodic driver for the three coordinator entry points.
///
/// The reconcile tick, the spec-propagation tick, and the ack consume loop
/// run concurrently with one another but each is serialized with itself (a
/// slow pass delays its own next tick, nothing else). Transient errors are
/// logged and absorbed; the next tick reconverges.
pub struct CoordinatorRuntime {
    coordinator: Arc<JobCoordinator>,
    config: CoordinatorConfig,
}

impl CoordinatorRuntime {
    pub fn new(coordinator: Arc<JobCoordinator>, config: CoordinatorConfig) -> Self {
        Self {
            coordinator,
            config,
        }
    }

    /// Run until the token is cancelled. Consumes the ack channel on the
    /// calling task and spawns the two periodic loops.
    pub async fn run(self, mut acks: mpsc::Receiver<AckRecord>, shutdown: CancellationToken) {
        let reconcile = {
            let coordinator = self.coordinator.clone();
            let token = shutdown.clone();
            let period = self.config.poll_interval();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tick.tick() => {
                            if let Err(e) = coordinator.poll().await {
                                tracing::error!(error = %e, "reconcile pass failed");
                            }
                        }
                    }
                }
            })
        };

        let notify = {
            let coordinator = self.coordinator.clone();
            let token = shutdown.clone();
            let period = self.config.notify_interval();
            tokio::spawn(async move {
                let mut tick = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = tick.tick() => {
                            if let Err(e) = coordinator.notify_jobs_when_feature_set_updated().await {
                                tracing::error!(error = %e, "spec propagation pass failed");
                            }
                        }
                    }
                }
            })
        };

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                record = acks.recv() => match record {
                    Some(record) => {
                        if let Err(e) = self.coordinator.listen_ack_from_jobs(&record).await {
                            tracing::error!(error = %e, "ack processing failed");
                        }
                    }
                    None => {
                        tracing::info!("ack channel closed, stopping coordinator");
                        break;
                    }
                },
            }
        }

        // Also reached when the ack channel closes; release the periodic
        // loops before joining them.
        shutdown.cancel();
        let _ = tokio::join!(reconcile, notify);
    }
}
