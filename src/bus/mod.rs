//! Message-bus surface for spec propagation.
//!
//! Two channels: specs are published keyed by feature-set reference, and
//! ingestion jobs acknowledge received versions on a separate topic. Broker
//! transports implement [`SpecPublisher`]; [`memory`] ships the in-process
//! one.

pub mod memory;

pub use memory::InMemoryBus;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::FeatureSetSpec;

/// Publisher side of the spec channel.
#[async_trait]
pub trait SpecPublisher: Send + Sync {
    /// Publish one spec keyed by `"project/name"`. Resolves when the broker
    /// acknowledges the publish itself, not when any consumer acks.
    /// Publishes are ordered per key.
    async fn send(&self, key: &str, spec: FeatureSetSpec) -> Result<()>;
}

/// Payload of one ack-channel message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecAck {
    pub feature_set_version: i32,
    pub job_name: String,
}

/// One record consumed from the ack channel. The key and payload come from
/// a shared topic and are untrusted; the listener validates everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckRecord {
    pub key: String,
    pub ack: SpecAck,
}

impl AckRecord {
    pub fn new(key: &str, feature_set_version: i32, job_name: &str) -> Self {
        Self {
            key: key.to_string(),
            ack: SpecAck {
                feature_set_version,
                job_name: job_name.to_string(),
            },
        }
    }
}
