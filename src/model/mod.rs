pub mod feature_set;
pub mod job;
pub mod source;
pub mod store;

pub use feature_set::{
    DeliveryStatus, EntitySpec, FeatureSet, FeatureSetJobStatus, FeatureSetRef, FeatureSetSpec,
    FeatureSetStatus, FeatureSpec, ValueType,
};
pub use job::{Job, JobKey, JobStatus, Runner};
pub use source::{Source, SourceConfig, SourceType};
pub use store::{Store, StoreConfig, Subscription};
