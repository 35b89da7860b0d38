//! `meraki_organizations_policy_objects`: a named address object shared by
//! an organization's firewall rules.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{deleted, lenient, missing_attribute, path_segment, requires_replacement};
use crate::http::DashboardClient;
use crate::provider::{Diagnostics, Resource, parse_import_id};
use crate::retry::Cancellation;

const TYPE_NAME: &str = "meraki_organizations_policy_objects";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyObject {
    pub organization_id: String,
    /// Assigned by the API on create.
    pub policy_object_id: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub object_type: Option<String>,
    pub cidr: Option<String>,
    pub fqdn: Option<String>,
    pub mask: Option<String>,
    pub ip: Option<String>,
    pub group_ids: Option<Vec<String>>,
    pub network_ids: Option<Vec<String>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyObjectRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    object_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cidr: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fqdn: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mask: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ip: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_ids: Option<&'a [String]>,
}

impl<'a> From<&'a PolicyObject> for PolicyObjectRequest<'a> {
    fn from(plan: &'a PolicyObject) -> Self {
        Self {
            name: plan.name.as_deref(),
            category: plan.category.as_deref(),
            object_type: plan.object_type.as_deref(),
            cidr: plan.cidr.as_deref(),
            fqdn: plan.fqdn.as_deref(),
            mask: plan.mask.as_deref(),
            ip: plan.ip.as_deref(),
            group_ids: plan.group_ids.as_deref(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct PolicyObjectResponse {
    #[serde(deserialize_with = "lenient::opt_string")]
    id: Option<String>,
    name: Option<String>,
    category: Option<String>,
    #[serde(rename = "type")]
    object_type: Option<String>,
    cidr: Option<String>,
    fqdn: Option<String>,
    mask: Option<String>,
    ip: Option<String>,
    group_ids: Option<Vec<String>>,
    network_ids: Option<Vec<String>>,
    created_at: Option<String>,
    updated_at: Option<String>,
}

impl PolicyObjectResponse {
    fn into_state(self, known: &PolicyObject) -> PolicyObject {
        PolicyObject {
            organization_id: known.organization_id.clone(),
            policy_object_id: known.policy_object_id.clone().or(self.id),
            name: self.name,
            category: self.category,
            object_type: self.object_type,
            cidr: self.cidr,
            fqdn: self.fqdn,
            mask: self.mask,
            ip: self.ip,
            group_ids: self.group_ids,
            network_ids: self.network_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

pub struct PolicyObjectResource {
    client: Arc<DashboardClient>,
}

impl PolicyObjectResource {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }
}

fn collection_path(organization_id: &str) -> Result<String, Diagnostics> {
    let organization_id = path_segment(TYPE_NAME, "organization_id", organization_id)?;
    Ok(format!("/organizations/{}/policyObjects", organization_id))
}

/// Path of an existing object; fails when state has no ID yet.
fn object_path(state: &PolicyObject) -> Result<String, Diagnostics> {
    let collection = collection_path(&state.organization_id)?;
    let id = path_segment(
        TYPE_NAME,
        "policy_object_id",
        state.policy_object_id.as_deref().unwrap_or_default(),
    )?;
    Ok(format!("{}/{}", collection, id))
}

#[async_trait]
impl Resource for PolicyObjectResource {
    type Model = PolicyObject;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn validate(&self, plan: &PolicyObject) -> Diagnostics {
        if let Err(diags) = collection_path(&plan.organization_id) {
            return diags;
        }
        let mut diags = Diagnostics::new();
        for (attribute, is_set) in [
            ("network_ids", plan.network_ids.is_some()),
            ("created_at", plan.created_at.is_some()),
            ("updated_at", plan.updated_at.is_some()),
        ] {
            if is_set {
                diags.add_warning(
                    "Computed Attribute Ignored",
                    format!("`{}` is reported by the Dashboard and is not sent.", attribute),
                );
            }
        }
        diags
    }

    #[tracing::instrument(skip(self, cancel, plan), fields(organization_id = %plan.organization_id))]
    async fn create(
        &self,
        cancel: &Cancellation,
        plan: PolicyObject,
    ) -> Result<PolicyObject, Diagnostics> {
        let path = collection_path(&plan.organization_id)?;
        for (attribute, value) in [
            ("name", &plan.name),
            ("category", &plan.category),
            ("type", &plan.object_type),
        ] {
            if value.is_none() {
                return Err(missing_attribute(TYPE_NAME, attribute));
            }
        }

        let request = PolicyObjectRequest::from(&plan);

        let response: PolicyObjectResponse = self
            .client
            .with_retry(cancel, "Create policy object", || {
                self.client.post(&path, &request)
            })
            .await
            .map_err(|e| Diagnostics::from_api_error("Failed to create policy object", &e))?;

        // The ID is assigned by the API; a planned one is not used.
        let state = response.into_state(&PolicyObject {
            policy_object_id: None,
            ..plan
        });
        info!(
            "Created policy object {} in organization {}",
            state.policy_object_id.as_deref().unwrap_or("<unknown>"),
            state.organization_id
        );
        Ok(state)
    }

    #[tracing::instrument(skip(self, _cancel, state), fields(organization_id = %state.organization_id))]
    async fn read(
        &self,
        _cancel: &Cancellation,
        state: PolicyObject,
    ) -> Result<Option<PolicyObject>, Diagnostics> {
        let path = object_path(&state)?;

        match self.client.get::<PolicyObjectResponse>(&path).await {
            Ok(response) => Ok(Some(response.into_state(&state))),
            Err(err) if err.is_not_found() => {
                debug!("Policy object at {} no longer exists", path);
                Ok(None)
            }
            Err(err) => Err(Diagnostics::from_api_error(
                "Failed to read policy object",
                &err,
            )),
        }
    }

    #[tracing::instrument(skip(self, cancel, plan, state), fields(organization_id = %state.organization_id))]
    async fn update(
        &self,
        cancel: &Cancellation,
        plan: PolicyObject,
        state: PolicyObject,
    ) -> Result<PolicyObject, Diagnostics> {
        let path = object_path(&state)?;
        if plan.organization_id != state.organization_id {
            return Err(requires_replacement(
                "organization_id",
                &state.organization_id,
                &plan.organization_id,
            ));
        }
        if let Some(planned) = plan.policy_object_id.as_deref() {
            let current = state.policy_object_id.as_deref().unwrap_or_default();
            if planned != current {
                return Err(requires_replacement("policy_object_id", current, planned));
            }
        }

        let request = PolicyObjectRequest::from(&plan);
        let response: PolicyObjectResponse = self
            .client
            .with_retry(cancel, "Update policy object", || {
                self.client.put(&path, &request)
            })
            .await
            .map_err(|e| Diagnostics::from_api_error("Failed to update policy object", &e))?;

        Ok(response.into_state(&state))
    }

    #[tracing::instrument(skip(self, cancel, state), fields(organization_id = %state.organization_id))]
    async fn delete(&self, cancel: &Cancellation, state: PolicyObject) -> Result<(), Diagnostics> {
        let path = object_path(&state)?;

        let result = self
            .client
            .with_retry(cancel, "Delete policy object", || self.client.delete(&path))
            .await;
        deleted(result, "Failed to delete policy object")
    }

    fn import_state(&self, id: &str) -> Result<PolicyObject, Diagnostics> {
        let [organization_id, policy_object_id] =
            parse_import_id(id, ["organization_id", "policy_object_id"])?;
        Ok(PolicyObject {
            organization_id,
            policy_object_id: Some(policy_object_id),
            ..Default::default()
        })
    }
}
