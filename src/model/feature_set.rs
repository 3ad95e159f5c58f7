use serde::{Deserialize, Serialize};

use crate::model::source::Source;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureSetStatus {
    Pending,
    Ready,
}

impl Default for FeatureSetStatus {
    fn default() -> Self {
        FeatureSetStatus::Pending
    }
}

/// Per-(feature set, job) record of whether the version most recently
/// published to that job has been acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    InProgress,
    Delivered,
}

/// Link between a feature set and one ingestion job.
///
/// Owned by the feature set; the job is held by id, not by containment.
/// `version` is the feature-set version most recently published to the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSetJobStatus {
    pub job_id: String,
    pub version: i32,
    pub delivery_status: DeliveryStatus,
}

/// The `"project/name"` identity of a feature set on the message bus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeatureSetRef {
    pub project: String,
    pub name: String,
}

impl FeatureSetRef {
    pub fn new(project: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
        }
    }

    /// Parse a bus key of the form `"project/name"`. Returns `None` for
    /// anything else, including empty components.
    pub fn parse(key: &str) -> Option<Self> {
        let (project, name) = key.split_once('/')?;
        if project.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(project, name))
    }
}

impl std::fmt::Display for FeatureSetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.project, self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueType {
    Bytes,
    String,
    Int32,
    Int64,
    Float,
    Double,
    Bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpec {
    pub name: String,
    pub value_type: ValueType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub name: String,
    pub value_type: ValueType,
}

/// The schema payload published on the spec channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSetSpec {
    pub project: String,
    pub name: String,
    pub version: i32,
    pub source: Source,
    pub entities: Vec<EntitySpec>,
    pub features: Vec<FeatureSpec>,
}

/// A named, versioned schema describing a group of features ingested
/// together. `(project, name)` is the primary identity; `version` is bumped
/// by the spec registry, never by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSet {
    pub project: String,
    pub name: String,
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub status: FeatureSetStatus,
    pub source: Source,
    #[serde(default)]
    pub entities: Vec<EntitySpec>,
    #[serde(default)]
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub job_statuses: Vec<FeatureSetJobStatus>,
}

impl FeatureSet {
    pub fn new(project: &str, name: &str, version: i32, source: Source) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
            version,
            status: FeatureSetStatus::Pending,
            source,
            entities: Vec::new(),
            features: Vec::new(),
            job_statuses: Vec::new(),
        }
    }

    pub fn reference(&self) -> FeatureSetRef {
        FeatureSetRef::new(&self.project, &self.name)
    }

    /// Ensure a delivery link to `job_id` exists. A fresh link starts at
    /// version 0 so the next propagation pass publishes the current spec.
    pub fn attach_job(&mut self, job_id: &str) {
        if self.job_statuses.iter().any(|l| l.job_id == job_id) {
            return;
        }
        self.job_statuses.push(FeatureSetJobStatus {
            job_id: job_id.to_string(),
            version: 0,
            delivery_status: DeliveryStatus::InProgress,
        });
    }

    pub fn link_mut(&mut self, job_id: &str) -> Option<&mut FeatureSetJobStatus> {
        self.job_statuses.iter_mut().find(|l| l.job_id == job_id)
    }

    pub fn spec(&self) -> FeatureSetSpec {
        FeatureSetSpec {
            project: self.project.clone(),
            name: self.name.clone(),
            version: self.version,
            source: self.source.clone(),
            entities: self.entities.clone(),
            features: self.features.clone(),
        }
    }
}
