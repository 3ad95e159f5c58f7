use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SourceType {
    Kafka,
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceType::Kafka => write!(f, "kafka"),
        }
    }
}

/// Type-specific connection details for a source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourceConfig {
    pub bootstrap_servers: String,
    pub topic: String,
}

/// An upstream stream a feature set is ingested from.
///
/// `id` is the surrogate persistence id. It never participates in
/// coordination equality: two sources describe the same stream iff their
/// `(source_type, config)` business key matches, and duplicates must be
/// collapsed to the canonical record (smallest id) before being used as a
/// job key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub source_type: SourceType,
    pub config: SourceConfig,
}

impl Source {
    pub fn kafka(id: i64, bootstrap_servers: &str, topic: &str) -> Self {
        Self {
            id,
            source_type: SourceType::Kafka,
            config: SourceConfig {
                bootstrap_servers: bootstrap_servers.to_string(),
                topic: topic.to_string(),
            },
        }
    }
}

// Equality by business key, not by surrogate id.
impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        self.source_type == other.source_type && self.config == other.config
    }
}

impl Eq for Source {}
