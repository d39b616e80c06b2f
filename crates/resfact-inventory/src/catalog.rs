//! Resource type catalog
//!
//! [`TypeCatalog`] is the only capability the collector consumes. The
//! built-in implementation, [`ProviderRegistry`], dispatches to one
//! [`ResourceProvider`] per type.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{InstanceHandle, ResolvedInstance, ResourceTypeName};

/// Catalog of resource types and their live instances
#[async_trait]
pub trait TypeCatalog: Send + Sync {
    /// All known type names, in enumeration order
    fn list_types(&self) -> Vec<ResourceTypeName>;

    /// List the current instances of `type_name`
    async fn list_instances(
        &self,
        type_name: &ResourceTypeName,
    ) -> Result<Vec<InstanceHandle>, ProviderError>;

    /// Resolve one instance to its title and attributes
    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError>;
}

/// Lists and describes the instances of a single resource type
#[async_trait]
pub trait ResourceProvider: Send + Sync {
    /// Type this provider serves
    fn type_name(&self) -> ResourceTypeName;

    /// List current instances
    async fn list(&self) -> Result<Vec<InstanceHandle>, ProviderError>;

    /// Resolve a handle previously returned by [`list`](Self::list)
    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError>;
}

/// Ordered set of providers, keyed by type name
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<(ResourceTypeName, Arc<dyn ResourceProvider>)>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider
    ///
    /// A provider for an already registered type replaces the earlier one
    /// and keeps its position.
    pub fn register(&mut self, provider: Arc<dyn ResourceProvider>) {
        let name = provider.type_name();
        if let Some(slot) = self.providers.iter_mut().find(|(n, _)| *n == name) {
            debug!(type_name = %name, "replacing provider");
            slot.1 = provider;
        } else {
            self.providers.push((name, provider));
        }
    }

    /// Builder-style [`register`](Self::register)
    #[must_use]
    pub fn with(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no types are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    fn provider(&self, name: &ResourceTypeName) -> Result<&Arc<dyn ResourceProvider>, ProviderError> {
        self.providers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, p)| p)
            .ok_or_else(|| ProviderError::UnknownType(name.to_string()))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("types", &self.list_types())
            .finish()
    }
}

#[async_trait]
impl TypeCatalog for ProviderRegistry {
    fn list_types(&self) -> Vec<ResourceTypeName> {
        self.providers.iter().map(|(n, _)| n.clone()).collect()
    }

    async fn list_instances(
        &self,
        type_name: &ResourceTypeName,
    ) -> Result<Vec<InstanceHandle>, ProviderError> {
        self.provider(type_name)?.list().await
    }

    async fn resolve(&self, handle: &InstanceHandle) -> Result<ResolvedInstance, ProviderError> {
        self.provider(&handle.type_name)?.resolve(handle).await
    }
}
