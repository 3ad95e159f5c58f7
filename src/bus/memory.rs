use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use crate::bus::{AckRecord, SpecPublisher};
use crate::error::{CoordinatorError, Result};
use crate::model::FeatureSetSpec;

/// A message published on the spec channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecMessage {
    pub key: String,
    pub spec: FeatureSetSpec,
}

/// In-process bus: published specs land in an inspectable log, acks flow
/// through an mpsc channel into the coordinator's consume loop.
#[derive(Debug)]
pub struct InMemoryBus {
    published: RwLock<Vec<SpecMessage>>,
    ack_tx: mpsc::Sender<AckRecord>,
}

impl InMemoryBus {
    /// Create the bus and hand back the ack-channel receiver for the
    /// runtime's consume loop.
    pub fn new(ack_capacity: usize) -> (Arc<Self>, mpsc::Receiver<AckRecord>) {
        let (ack_tx, ack_rx) = mpsc::channel(ack_capacity);
        let bus = Arc::new(Self {
            published: RwLock::new(Vec::new()),
            ack_tx,
        });
        (bus, ack_rx)
    }

    /// Everything published so far, in publish order.
    pub async fn published(&self) -> Vec<SpecMessage> {
        self.published.read().await.clone()
    }

    /// Feed one ack record into the consume side, as an ingestion job would.
    pub async fn ack(&self, record: AckRecord) -> Result<()> {
        self.ack_tx
            .send(record)
            .await
            .map_err(|e| CoordinatorError::Publish(format!("ack channel closed: {e}")))
    }
}

#[async_trait]
impl SpecPublisher for InMemoryBus {
    async fn send(&self, key: &str, spec: FeatureSetSpec) -> Result<()> {
        let mut published = self.published.write().await;
        published.push(SpecMessage {
            key: key.to_string(),
            spec,
        });
        Ok(())
    }
}
