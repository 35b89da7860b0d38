//! Registry of resources and data sources by type name.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::{DynDataSource, DynResource};
use crate::http::DashboardClient;
use crate::resources::{
    ApplianceVlanResource, NetworksDataSource, PolicyObjectResource, SyslogServersResource,
};

/// Lookup table from type name (e.g. `meraki_networks_syslog_servers`) to
/// implementation.
#[derive(Default)]
pub struct ProviderRegistry {
    resources: BTreeMap<&'static str, Arc<dyn DynResource>>,
    data_sources: BTreeMap<&'static str, Arc<dyn DynDataSource>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in resource and data source, all sharing
    /// `client`.
    pub fn with_dashboard(client: Arc<DashboardClient>) -> Self {
        let mut registry = Self::new();

        registry.register_resource(Arc::new(ApplianceVlanResource::new(Arc::clone(&client))));
        registry.register_resource(Arc::new(SyslogServersResource::new(Arc::clone(&client))));
        registry.register_resource(Arc::new(PolicyObjectResource::new(Arc::clone(&client))));
        registry.register_data_source(Arc::new(NetworksDataSource::new(client)));

        registry
    }

    /// Register a resource. An existing one with the same type name is
    /// replaced.
    pub fn register_resource(&mut self, resource: Arc<dyn DynResource>) {
        self.resources.insert(resource.type_name(), resource);
    }

    pub fn register_data_source(&mut self, data_source: Arc<dyn DynDataSource>) {
        self.data_sources.insert(data_source.type_name(), data_source);
    }

    pub fn resource(&self, type_name: &str) -> Option<&Arc<dyn DynResource>> {
        self.resources.get(type_name)
    }

    pub fn data_source(&self, type_name: &str) -> Option<&Arc<dyn DynDataSource>> {
        self.data_sources.get(type_name)
    }

    /// Registered resource type names, sorted.
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.keys().copied().collect()
    }

    /// Registered data source type names, sorted.
    pub fn data_source_types(&self) -> Vec<&'static str> {
        self.data_sources.keys().copied().collect()
    }
}
