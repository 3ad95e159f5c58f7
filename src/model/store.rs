use serde::{Deserialize, Serialize};

/// Sink-specific connection details for a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreConfig {
    Redis { host: String, port: u16 },
    BigQuery { project_id: String, dataset_id: String },
}

/// A (project, name) predicate selecting which feature sets a store
/// consumes. `*` matches any value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub project: String,
    pub name: String,
}

impl Subscription {
    pub fn new(project: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
        }
    }
}

/// An addressable sink serving ingested features. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub name: String,
    pub config: StoreConfig,
    pub subscriptions: Vec<Subscription>,
}

impl Store {
    pub fn new(name: &str, config: StoreConfig, subscriptions: Vec<Subscription>) -> Self {
        Self {
            name: name.to_string(),
            config,
            subscriptions,
        }
    }
}
