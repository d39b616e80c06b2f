//! Resource collection
//!
//! Walks the catalog one type at a time. A type is either collected in
//! full or left out of the inventory entirely; why it was left out is
//! recorded in the [`CollectionReport`].

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::allow_list::AllowList;
use crate::catalog::TypeCatalog;
use crate::error::ProviderError;
use crate::types::{Inventory, ResourceTypeName, TypeResult};

/// What happened to one resource type during a run
#[derive(Debug, Clone, PartialEq)]
pub enum TypeStatus {
    /// Every instance resolved; the type is in the inventory
    Collected {
        /// Number of distinct titles stored
        instances: usize,
        /// Distinct titles reported more than once (the last one was kept)
        duplicate_titles: Vec<String>,
    },
    /// Not on the allow-list; never attempted
    Filtered,
    /// Listed zero instances
    Empty,
    /// Listing the instances failed
    EnumerationFault(ProviderError),
    /// Resolving one instance failed; the whole type was discarded
    ResolutionFault {
        /// Handle id of the failing instance
        instance: String,
        /// Provider error
        error: ProviderError,
    },
}

impl TypeStatus {
    /// Whether the type ended up in the inventory
    #[must_use]
    pub fn is_collected(&self) -> bool {
        matches!(self, TypeStatus::Collected { .. })
    }

    /// Whether the type was dropped because of a provider fault
    #[must_use]
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            TypeStatus::EnumerationFault(_) | TypeStatus::ResolutionFault { .. }
        )
    }
}

impl fmt::Display for TypeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeStatus::Collected {
                instances,
                duplicate_titles,
            } if duplicate_titles.is_empty() => write!(f, "collected {instances} instances"),
            TypeStatus::Collected {
                instances,
                duplicate_titles,
            } => write!(
                f,
                "collected {instances} instances ({} duplicate titles overwritten)",
                duplicate_titles.len()
            ),
            TypeStatus::Filtered => f.write_str("filtered by allow-list"),
            TypeStatus::Empty => f.write_str("no instances"),
            TypeStatus::EnumerationFault(e) => write!(f, "listing failed: {e}"),
            TypeStatus::ResolutionFault { instance, error } => {
                write!(f, "resolving {instance} failed: {error}")
            }
        }
    }
}

/// Outcome for one catalog type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeOutcome {
    /// Resource type
    pub type_name: ResourceTypeName,
    /// What happened to it
    pub status: TypeStatus,
}

/// Per-type outcomes of a run, in catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionReport {
    /// One entry per catalog type
    pub outcomes: Vec<TypeOutcome>,
}

/// Aggregate counts over a [`CollectionReport`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// Types present in the inventory
    pub collected: usize,
    /// Types skipped by the allow-list
    pub filtered: usize,
    /// Types with no instances
    pub empty: usize,
    /// Types dropped because of a fault
    pub faulted: usize,
    /// Total instances across collected types
    pub instances: usize,
}

impl CollectionReport {
    /// Status recorded for `type_name`, if the catalog listed it
    #[must_use]
    pub fn status_of(&self, type_name: &str) -> Option<&TypeStatus> {
        self.outcomes
            .iter()
            .find(|o| o.type_name.as_str() == type_name)
            .map(|o| &o.status)
    }

    /// Outcomes of types that faulted
    pub fn faults(&self) -> impl Iterator<Item = &TypeOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_fault())
    }

    /// Count outcomes by kind
    #[must_use]
    pub fn summary(&self) -> ReportSummary {
        self.outcomes
            .iter()
            .fold(ReportSummary::default(), |mut acc, o| {
                match &o.status {
                    TypeStatus::Collected { instances, .. } => {
                        acc.collected += 1;
                        acc.instances += instances;
                    }
                    TypeStatus::Filtered => acc.filtered += 1,
                    TypeStatus::Empty => acc.empty += 1,
                    TypeStatus::EnumerationFault(_) | TypeStatus::ResolutionFault { .. } => {
                        acc.faulted += 1;
                    }
                }
                acc
            })
    }
}

/// Result of one collection pass
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Collected types
    pub inventory: Inventory,
    /// Why each catalog type is or isn't in the inventory
    pub report: CollectionReport,
}

/// Resource collector
///
/// Produces an [`Inventory`] from a [`TypeCatalog`]. Types are processed
/// strictly one after another.
pub struct ResourceCollector {
    catalog: Arc<dyn TypeCatalog>,
}

impl ResourceCollector {
    /// Create a collector over `catalog`
    pub fn new(catalog: Arc<dyn TypeCatalog>) -> Self {
        Self { catalog }
    }

    /// Run one collection pass
    ///
    /// Never fails. Provider errors only show up as missing inventory keys
    /// and in the returned report.
    #[instrument(skip_all, fields(unrestricted = allow_list.is_unrestricted()))]
    pub async fn collect(&self, allow_list: &AllowList) -> Collection {
        info!("collecting resources");

        let mut collection = Collection::default();

        for type_name in self.catalog.list_types() {
            let status = if allow_list.permits(&type_name) {
                match self.retrieve(&type_name).await {
                    Ok(Some((result, duplicate_titles))) => {
                        let instances = result.len();
                        collection.inventory.insert(type_name.clone(), result);
                        TypeStatus::Collected {
                            instances,
                            duplicate_titles,
                        }
                    }
                    Ok(None) => TypeStatus::Empty,
                    Err(status) => status,
                }
            } else {
                debug!(type_name = %type_name, "not on allow-list, skipping");
                TypeStatus::Filtered
            };

            collection.report.outcomes.push(TypeOutcome { type_name, status });
        }

        let summary = collection.report.summary();
        info!(
            collected = summary.collected,
            faulted = summary.faulted,
            instances = summary.instances,
            "resource collection completed"
        );

        collection
    }

    /// Retrieve every instance of one type
    ///
    /// `Ok(None)` means no instances. On `Err` the partial result is gone.
    #[instrument(skip(self), fields(type_name = %type_name))]
    async fn retrieve(
        &self,
        type_name: &ResourceTypeName,
    ) -> Result<Option<(TypeResult, Vec<String>)>, TypeStatus> {
        let handles = self.catalog.list_instances(type_name).await.map_err(|e| {
            warn!(error = %e, "listing instances failed, skipping type");
            TypeStatus::EnumerationFault(e)
        })?;

        if handles.is_empty() {
            debug!("no instances");
            return Ok(None);
        }

        let mut result = TypeResult::new();
        let mut duplicate_titles = Vec::new();

        for handle in &handles {
            let resolved = self.catalog.resolve(handle).await.map_err(|e| {
                warn!(instance = %handle.id, error = %e, "resolving instance failed, skipping type");
                TypeStatus::ResolutionFault {
                    instance: handle.id.clone(),
                    error: e,
                }
            })?;

            if result
                .insert(resolved.title.clone(), resolved.attributes)
                .is_some()
            {
                warn!(title = %resolved.title, "duplicate title, keeping the last one");
                if !duplicate_titles.contains(&resolved.title) {
                    duplicate_titles.push(resolved.title);
                }
            }
        }

        debug!(instances = result.len(), "retrieved type");

        Ok(Some((result, duplicate_titles)))
    }
}
