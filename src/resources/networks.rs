//! `meraki_networks` data source: the networks of an organization.

use std::sync::Arc;

use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};

use super::path_segment;
use crate::http::DashboardClient;
use crate::provider::{DataSource, Diagnostics};
use crate::retry::Cancellation;

const TYPE_NAME: &str = "meraki_networks";

#[derive(Debug, Clone, Deserialize)]
pub struct NetworksConfig {
    pub organization_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Networks {
    pub organization_id: String,
    pub items: Vec<Network>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub organization_id: Option<String>,
    pub name: Option<String>,
    pub product_types: Vec<String>,
    pub time_zone: Option<String>,
    pub tags: Vec<String>,
    pub enrollment_string: Option<String>,
    pub url: Option<String>,
    pub notes: Option<String>,
    pub is_bound_to_config_template: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct NetworkResponse {
    id: String,
    organization_id: Option<String>,
    name: Option<String>,
    product_types: Vec<String>,
    time_zone: Option<String>,
    tags: Vec<String>,
    enrollment_string: Option<String>,
    url: Option<String>,
    notes: Option<String>,
    is_bound_to_config_template: Option<bool>,
}

impl From<NetworkResponse> for Network {
    fn from(r: NetworkResponse) -> Self {
        Self {
            id: r.id,
            organization_id: r.organization_id,
            name: r.name,
            product_types: r.product_types,
            time_zone: r.time_zone,
            tags: r.tags,
            enrollment_string: r.enrollment_string,
            url: r.url,
            notes: r.notes,
            is_bound_to_config_template: r.is_bound_to_config_template,
        }
    }
}

pub struct NetworksDataSource {
    client: Arc<DashboardClient>,
}

impl NetworksDataSource {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for NetworksDataSource {
    type Config = NetworksConfig;
    type Model = Networks;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    #[tracing::instrument(skip(self, cancel, config), fields(organization_id = %config.organization_id))]
    async fn read(
        &self,
        cancel: &Cancellation,
        config: NetworksConfig,
    ) -> Result<Networks, Diagnostics> {
        let organization_id =
            path_segment(TYPE_NAME, "organization_id", &config.organization_id)?;
        let path = format!("/organizations/{}/networks", organization_id);
        let response: Vec<NetworkResponse> = self
            .client
            .with_retry(cancel, "List networks", || self.client.get(&path))
            .await
            .map_err(|e| Diagnostics::from_api_error("Failed to read networks", &e))?;

        info!(
            "Found {} network(s) in organization {}",
            response.len(),
            config.organization_id
        );
        Ok(Networks {
            organization_id: config.organization_id,
            items: response.into_iter().map(Network::from).collect(),
        })
    }
}
