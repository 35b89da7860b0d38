//! Service factory for building command dependencies.
//!
//! Keeps construction of the Dashboard client and registry out of the
//! individual commands, so tests can hand them a client pointed at a mock
//! server.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use log::debug;

use crate::config::{ConfigOverrides, ProviderConfig};
use crate::http::DashboardClient;
use crate::provider::{DynDataSource, DynResource, ProviderRegistry};
use crate::runtime::Runtime;

/// Container for everything a command needs to reach the Dashboard.
pub struct Services {
    pub client: Arc<DashboardClient>,
    pub registry: ProviderRegistry,
}

impl Services {
    /// Services sharing `client` across all built-in resources.
    pub fn new(client: Arc<DashboardClient>) -> Self {
        let registry = ProviderRegistry::with_dashboard(Arc::clone(&client));
        Self { client, registry }
    }

    /// Build services from environment and CLI overrides.
    #[tracing::instrument(skip(runtime, overrides))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, overrides: ConfigOverrides) -> Result<Self> {
        let config = ProviderConfig::load(runtime, overrides)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let client = DashboardClient::from_config(config)?;
        debug!(
            "Dashboard client ready for {} ({} retries, {}ms delay)",
            client.base_url(),
            config.max_retries,
            config.retry_delay.as_millis()
        );
        Ok(Self::new(Arc::new(client)))
    }

    /// Looks up a resource type, listing the known ones when it is missing.
    pub fn resource(&self, type_name: &str) -> Result<&Arc<dyn DynResource>> {
        self.registry.resource(type_name).ok_or_else(|| {
            anyhow!(
                "Unknown resource type '{}'. Available: {}",
                type_name,
                self.registry.resource_types().join(", ")
            )
        })
    }

    pub fn data_source(&self, type_name: &str) -> Result<&Arc<dyn DynDataSource>> {
        self.registry.data_source(type_name).ok_or_else(|| {
            anyhow!(
                "Unknown data source '{}'. Available: {}",
                type_name,
                self.registry.data_source_types().join(", ")
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::API_KEY_ENV;
    use crate::runtime::MockRuntime;
    use mockito::{Matcher, Server};

    #[tokio::test]
    async fn test_load_authenticates_requests() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/organizations/O_1/networks")
            .match_header("Authorization", Matcher::Exact("Bearer secret".to_string()))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let mut runtime = MockRuntime::new();
        runtime.expect_env_var().returning(|key| match key {
            API_KEY_ENV => Ok("secret".to_string()),
            _ => Err(std::env::VarError::NotPresent),
        });

        let services = Services::load(
            &runtime,
            ConfigOverrides {
                base_url: Some(server.url()),
                ..Default::default()
            },
        )
        .unwrap();

        let networks: Vec<serde_json::Value> = services
            .client
            .get("/organizations/O_1/networks")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(networks.is_empty());
    }

    #[test]
    fn test_load_requires_api_key() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_env_var()
            .returning(|_| Err(std::env::VarError::NotPresent));

        let err = Services::load(&runtime, ConfigOverrides::default())
            .err()
            .unwrap();

        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test]
    async fn test_unknown_types_list_alternatives() {
        let server = Server::new_async().await;
        let services = crate::commands::test_support::services_for(&server);

        assert!(services.resource("meraki_networks_syslog_servers").is_ok());
        let err = services.resource("meraki_widgets").err().unwrap();
        assert!(err.to_string().contains("meraki_networks_appliance_vlans"));

        assert!(services.data_source("meraki_networks").is_ok());
        let err = services.data_source("meraki_devices").err().unwrap();
        assert!(err.to_string().contains("meraki_networks"));
    }
}
