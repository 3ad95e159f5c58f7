//! Spec-registry surface: the coordinator's read-only view of configured
//! stores and registered feature sets.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::model::{FeatureSet, Store};
use crate::repository::FeatureSetRepository;

/// Advisory store filter; an implementation may ignore it.
#[derive(Debug, Clone, Default)]
pub struct StoreFilter {
    pub name: Option<String>,
}

/// Glob filter over feature sets, `*` matching any value.
#[derive(Debug, Clone)]
pub struct FeatureSetFilter {
    pub project: String,
    pub name: String,
}

impl FeatureSetFilter {
    pub fn new(project: &str, name: &str) -> Self {
        Self {
            project: project.to_string(),
            name: name.to_string(),
        }
    }
}

#[async_trait]
pub trait SpecService: Send + Sync {
    async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>>;

    /// Feature sets matching the filter, ordered by name ascending.
    async fn list_feature_sets(&self, filter: &FeatureSetFilter) -> Result<Vec<FeatureSet>>;
}

/// Registry backed by an in-process store list and the feature-set
/// repository. Glob filters are translated to the repository's `LIKE`
/// patterns here, at the query boundary.
pub struct RegistryService {
    stores: RwLock<Vec<Store>>,
    feature_sets: Arc<dyn FeatureSetRepository>,
}

impl RegistryService {
    pub fn new(feature_sets: Arc<dyn FeatureSetRepository>) -> Self {
        Self {
            stores: RwLock::new(Vec::new()),
            feature_sets,
        }
    }

    pub async fn register_store(&self, store: Store) {
        self.stores.write().await.push(store);
    }
}

fn glob_to_like(glob: &str) -> String {
    glob.replace('*', "%")
}

#[async_trait]
impl SpecService for RegistryService {
    async fn list_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>> {
        let stores = self.stores.read().await;
        Ok(stores
            .iter()
            .filter(|s| filter.name.as_deref().map_or(true, |n| n == s.name))
            .cloned()
            .collect())
    }

    async fn list_feature_sets(&self, filter: &FeatureSetFilter) -> Result<Vec<FeatureSet>> {
        self.feature_sets
            .find_all_matching(&glob_to_like(&filter.name), &glob_to_like(&filter.project))
            .await
    }
}
