//! `meraki_networks_appliance_vlans`: a VLAN on a network's MX appliance.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{deleted, lenient, missing_attribute, path_segment, requires_replacement};
use crate::http::DashboardClient;
use crate::provider::{Diagnostics, Resource, parse_import_id};
use crate::retry::Cancellation;

const TYPE_NAME: &str = "meraki_networks_appliance_vlans";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplianceVlan {
    pub network_id: String,
    pub vlan_id: String,
    pub name: Option<String>,
    pub subnet: Option<String>,
    pub appliance_ip: Option<String>,
    pub group_policy_id: Option<String>,
    pub vpn_nat_subnet: Option<String>,
    pub dhcp_handling: Option<String>,
    pub dhcp_lease_time: Option<String>,
    pub dhcp_boot_options_enabled: Option<bool>,
    pub dns_nameservers: Option<String>,
    pub reserved_ip_ranges: Option<Vec<ReservedIpRange>>,
    /// Computed by the API.
    pub interface_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReservedIpRange {
    pub start: String,
    pub end: String,
    pub comment: Option<String>,
}

impl ApplianceVlan {
    /// Whether the plan sets anything the create call does not accept.
    fn has_update_only_attributes(&self) -> bool {
        self.vpn_nat_subnet.is_some()
            || self.dhcp_handling.is_some()
            || self.dhcp_lease_time.is_some()
            || self.dhcp_boot_options_enabled.is_some()
            || self.dns_nameservers.is_some()
            || self.reserved_ip_ranges.is_some()
    }

    fn path(&self) -> String {
        format!(
            "/networks/{}/appliance/vlans/{}",
            self.network_id, self.vlan_id
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateVlanRequest<'a> {
    id: &'a str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subnet: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appliance_ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_policy_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateVlanRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subnet: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    appliance_ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_policy_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    vpn_nat_subnet: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp_handling: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp_lease_time: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dhcp_boot_options_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dns_nameservers: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reserved_ip_ranges: Option<&'a [ReservedIpRange]>,
}

impl<'a> From<&'a ApplianceVlan> for UpdateVlanRequest<'a> {
    fn from(plan: &'a ApplianceVlan) -> Self {
        Self {
            name: plan.name.as_deref(),
            subnet: plan.subnet.as_deref(),
            appliance_ip: plan.appliance_ip.as_deref(),
            group_policy_id: plan.group_policy_id.as_deref(),
            vpn_nat_subnet: plan.vpn_nat_subnet.as_deref(),
            dhcp_handling: plan.dhcp_handling.as_deref(),
            dhcp_lease_time: plan.dhcp_lease_time.as_deref(),
            dhcp_boot_options_enabled: plan.dhcp_boot_options_enabled,
            dns_nameservers: plan.dns_nameservers.as_deref(),
            reserved_ip_ranges: plan.reserved_ip_ranges.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct VlanResponse {
    name: Option<String>,
    subnet: Option<String>,
    appliance_ip: Option<String>,
    #[serde(deserialize_with = "lenient::opt_string")]
    group_policy_id: Option<String>,
    vpn_nat_subnet: Option<String>,
    dhcp_handling: Option<String>,
    dhcp_lease_time: Option<String>,
    dhcp_boot_options_enabled: Option<bool>,
    dns_nameservers: Option<String>,
    reserved_ip_ranges: Option<Vec<ReservedIpRange>>,
    #[serde(deserialize_with = "lenient::opt_string")]
    interface_id: Option<String>,
}

impl VlanResponse {
    /// State as reported by the API. The identity always comes from `known`,
    /// the one the request was addressed to.
    fn into_state(self, known: &ApplianceVlan) -> ApplianceVlan {
        ApplianceVlan {
            network_id: known.network_id.clone(),
            vlan_id: known.vlan_id.clone(),
            name: self.name,
            subnet: self.subnet,
            appliance_ip: self.appliance_ip,
            group_policy_id: self.group_policy_id,
            vpn_nat_subnet: self.vpn_nat_subnet,
            dhcp_handling: self.dhcp_handling,
            dhcp_lease_time: self.dhcp_lease_time,
            dhcp_boot_options_enabled: self.dhcp_boot_options_enabled,
            dns_nameservers: self.dns_nameservers,
            reserved_ip_ranges: self.reserved_ip_ranges,
            interface_id: self.interface_id,
        }
    }
}

pub struct ApplianceVlanResource {
    client: Arc<DashboardClient>,
}

impl ApplianceVlanResource {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }

    async fn put_update(
        &self,
        cancel: &Cancellation,
        plan: &ApplianceVlan,
        summary: &str,
    ) -> Result<VlanResponse, Diagnostics> {
        let path = plan.path();
        let request = UpdateVlanRequest::from(plan);

        self.client
            .with_retry(cancel, summary, || self.client.put(&path, &request))
            .await
            .map_err(|e| Diagnostics::from_api_error(summary, &e))
    }
}

fn require_identity(vlan: &ApplianceVlan) -> Result<(), Diagnostics> {
    path_segment(TYPE_NAME, "network_id", &vlan.network_id)?;
    path_segment(TYPE_NAME, "vlan_id", &vlan.vlan_id)?;
    Ok(())
}

#[async_trait]
impl Resource for ApplianceVlanResource {
    type Model = ApplianceVlan;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn validate(&self, plan: &ApplianceVlan) -> Diagnostics {
        if let Err(diags) = require_identity(plan) {
            return diags;
        }
        let mut diags = Diagnostics::new();
        if plan.interface_id.is_some() {
            diags.add_warning(
                "Computed Attribute Ignored",
                "`interface_id` is assigned by the Dashboard and is not sent.",
            );
        }
        diags
    }

    #[tracing::instrument(skip(self, cancel, plan), fields(network_id = %plan.network_id, vlan_id = %plan.vlan_id))]
    async fn create(
        &self,
        cancel: &Cancellation,
        plan: ApplianceVlan,
    ) -> Result<ApplianceVlan, Diagnostics> {
        require_identity(&plan)?;
        let name = plan
            .name
            .as_deref()
            .ok_or_else(|| missing_attribute(TYPE_NAME, "name"))?;

        let path = format!("/networks/{}/appliance/vlans", plan.network_id);
        let request = CreateVlanRequest {
            id: &plan.vlan_id,
            name,
            subnet: plan.subnet.as_deref(),
            appliance_ip: plan.appliance_ip.as_deref(),
            group_policy_id: plan.group_policy_id.as_deref(),
        };

        let mut response: VlanResponse = self
            .client
            .with_retry(cancel, "Create VLAN", || self.client.post(&path, &request))
            .await
            .map_err(|e| Diagnostics::from_api_error("Failed to create VLAN", &e))?;

        // DHCP and VPN settings can only be set once the VLAN exists.
        if plan.has_update_only_attributes() {
            debug!("Applying update-only VLAN attributes");
            response = self
                .put_update(cancel, &plan, "Failed to configure VLAN after creation")
                .await?;
        }

        info!(
            "Created VLAN {} on network {}",
            plan.vlan_id, plan.network_id
        );
        Ok(response.into_state(&plan))
    }

    #[tracing::instrument(skip(self, _cancel, state), fields(network_id = %state.network_id, vlan_id = %state.vlan_id))]
    async fn read(
        &self,
        _cancel: &Cancellation,
        state: ApplianceVlan,
    ) -> Result<Option<ApplianceVlan>, Diagnostics> {
        require_identity(&state)?;

        match self.client.get::<VlanResponse>(&state.path()).await {
            Ok(response) => Ok(Some(response.into_state(&state))),
            Err(err) if err.is_not_found() => {
                debug!("VLAN {} no longer exists", state.vlan_id);
                Ok(None)
            }
            Err(err) => Err(Diagnostics::from_api_error("Failed to read VLAN", &err)),
        }
    }

    #[tracing::instrument(skip(self, cancel, plan, state), fields(network_id = %state.network_id, vlan_id = %state.vlan_id))]
    async fn update(
        &self,
        cancel: &Cancellation,
        plan: ApplianceVlan,
        state: ApplianceVlan,
    ) -> Result<ApplianceVlan, Diagnostics> {
        require_identity(&state)?;
        if plan.network_id != state.network_id {
            return Err(requires_replacement(
                "network_id",
                &state.network_id,
                &plan.network_id,
            ));
        }
        if plan.vlan_id != state.vlan_id {
            return Err(requires_replacement("vlan_id", &state.vlan_id, &plan.vlan_id));
        }

        let response = self.put_update(cancel, &plan, "Failed to update VLAN").await?;
        Ok(response.into_state(&state))
    }

    #[tracing::instrument(skip(self, cancel, state), fields(network_id = %state.network_id, vlan_id = %state.vlan_id))]
    async fn delete(&self, cancel: &Cancellation, state: ApplianceVlan) -> Result<(), Diagnostics> {
        require_identity(&state)?;
        let path = state.path();

        let result = self
            .client
            .with_retry(cancel, "Delete VLAN", || self.client.delete(&path))
            .await;
        deleted(result, "Failed to delete VLAN")
    }

    fn import_state(&self, id: &str) -> Result<ApplianceVlan, Diagnostics> {
        let [network_id, vlan_id] = parse_import_id(id, ["network_id", "vlan_id"])?;
        Ok(ApplianceVlan {
            network_id,
            vlan_id,
            ..Default::default()
        })
    }
}
