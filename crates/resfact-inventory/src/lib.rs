//! resfact-inventory: resource inventory collection
//!
//! Walks every resource type a [`TypeCatalog`] knows about, retrieves the
//! live instances of each, and folds them into a JSON-safe nested map
//! (`type -> title -> attributes`). One broken type never aborts a run.

pub mod allow_list;
pub mod catalog;
pub mod collector;
pub mod error;
pub mod providers;
pub mod serializer;
pub mod types;

pub use allow_list::{AllowList, AllowListSource, DEFAULT_ALLOW_LIST_PATH};
pub use catalog::{ProviderRegistry, ResourceProvider, TypeCatalog};
pub use collector::{
    Collection, CollectionReport, ReportSummary, ResourceCollector, TypeOutcome, TypeStatus,
};
pub use error::{AllowListError, ProviderError};
pub use providers::{ProviderSettings, system_catalog};
pub use serializer::{Normalized, SerializationAnomaly, normalize, to_fact_json};
pub use types::{
    AttributeValue, Attributes, InstanceHandle, Inventory, ResolvedInstance, ResourceTypeName,
    TypeResult,
};
