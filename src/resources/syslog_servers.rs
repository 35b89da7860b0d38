//! `meraki_networks_syslog_servers`: the syslog server list of a network.
//!
//! The list is a per-network singleton: create and update both replace it,
//! delete empties it.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use super::{deleted, lenient, path_segment, requires_replacement};
use crate::http::DashboardClient;
use crate::provider::{Diagnostics, Resource, parse_import_id};
use crate::retry::Cancellation;

const TYPE_NAME: &str = "meraki_networks_syslog_servers";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogServers {
    pub network_id: String,
    pub servers: Vec<SyslogServer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyslogServer {
    pub host: String,
    #[serde(deserialize_with = "lenient::port")]
    pub port: u16,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Request and response share one shape.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SyslogServersBody {
    #[serde(default)]
    servers: Vec<SyslogServer>,
}

pub struct SyslogServersResource {
    client: Arc<DashboardClient>,
}

impl SyslogServersResource {
    pub fn new(client: Arc<DashboardClient>) -> Self {
        Self { client }
    }

    async fn replace(
        &self,
        cancel: &Cancellation,
        network_id: &str,
        servers: &[SyslogServer],
        summary: &str,
    ) -> Result<SyslogServers, Diagnostics> {
        let path = servers_path(network_id)?;
        let request = SyslogServersBody {
            servers: servers.to_vec(),
        };

        let response: SyslogServersBody = self
            .client
            .with_retry(cancel, summary, || self.client.put(&path, &request))
            .await
            .map_err(|e| Diagnostics::from_api_error(summary, &e))?;

        Ok(SyslogServers {
            network_id: network_id.to_string(),
            servers: response.servers,
        })
    }
}

fn servers_path(network_id: &str) -> Result<String, Diagnostics> {
    let network_id = path_segment(TYPE_NAME, "network_id", network_id)?;
    Ok(format!("/networks/{}/syslogServers", network_id))
}

/// Errors block the write. A server listed twice only warns, the Dashboard
/// keeps one of them.
fn check_plan(plan: &SyslogServers) -> Diagnostics {
    if let Err(diags) = path_segment(TYPE_NAME, "network_id", &plan.network_id) {
        return diags;
    }

    let mut diags = Diagnostics::new();
    let mut seen = HashSet::new();
    for (i, server) in plan.servers.iter().enumerate() {
        if server.host.trim().is_empty() {
            diags.add_error(
                "Invalid Attribute Value",
                format!("servers[{}].host must not be empty", i),
            );
        }
        if server.port == 0 {
            diags.add_error(
                "Invalid Attribute Value",
                format!("servers[{}].port must be between 1 and 65535", i),
            );
        }
        if !seen.insert((server.host.trim(), server.port)) {
            diags.add_warning(
                "Duplicate Syslog Server",
                format!(
                    "servers[{}] repeats {}:{}; only one entry will be kept",
                    i,
                    server.host.trim(),
                    server.port
                ),
            );
        }
    }
    diags
}

fn require_valid(plan: &SyslogServers) -> Result<(), Diagnostics> {
    let diags = check_plan(plan);
    if diags.has_error() { Err(diags) } else { Ok(()) }
}

#[async_trait]
impl Resource for SyslogServersResource {
    type Model = SyslogServers;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn validate(&self, plan: &SyslogServers) -> Diagnostics {
        check_plan(plan)
    }

    #[tracing::instrument(skip(self, cancel, plan), fields(network_id = %plan.network_id))]
    async fn create(
        &self,
        cancel: &Cancellation,
        plan: SyslogServers,
    ) -> Result<SyslogServers, Diagnostics> {
        require_valid(&plan)?;
        let state = self
            .replace(
                cancel,
                &plan.network_id,
                &plan.servers,
                "Failed to set syslog servers",
            )
            .await?;

        info!(
            "Configured {} syslog server(s) on network {}",
            state.servers.len(),
            state.network_id
        );
        Ok(state)
    }

    #[tracing::instrument(skip(self, _cancel, state), fields(network_id = %state.network_id))]
    async fn read(
        &self,
        _cancel: &Cancellation,
        state: SyslogServers,
    ) -> Result<Option<SyslogServers>, Diagnostics> {
        let path = servers_path(&state.network_id)?;

        match self.client.get::<SyslogServersBody>(&path).await {
            Ok(response) => Ok(Some(SyslogServers {
                network_id: state.network_id,
                servers: response.servers,
            })),
            Err(err) if err.is_not_found() => {
                debug!("Network {} no longer exists", state.network_id);
                Ok(None)
            }
            Err(err) => Err(Diagnostics::from_api_error(
                "Failed to read syslog servers",
                &err,
            )),
        }
    }

    #[tracing::instrument(skip(self, cancel, plan, state), fields(network_id = %state.network_id))]
    async fn update(
        &self,
        cancel: &Cancellation,
        plan: SyslogServers,
        state: SyslogServers,
    ) -> Result<SyslogServers, Diagnostics> {
        require_valid(&plan)?;
        if plan.network_id != state.network_id {
            return Err(requires_replacement(
                "network_id",
                &state.network_id,
                &plan.network_id,
            ));
        }

        self.replace(
            cancel,
            &plan.network_id,
            &plan.servers,
            "Failed to update syslog servers",
        )
        .await
    }

    #[tracing::instrument(skip(self, cancel, state), fields(network_id = %state.network_id))]
    async fn delete(&self, cancel: &Cancellation, state: SyslogServers) -> Result<(), Diagnostics> {
        let path = servers_path(&state.network_id)?;
        let request = SyslogServersBody::default();

        let result = self
            .client
            .with_retry(cancel, "Clear syslog servers", || {
                self.client.put::<_, SyslogServersBody>(&path, &request)
            })
            .await
            .map(|_| ());
        deleted(result, "Failed to clear syslog servers")
    }

    fn import_state(&self, id: &str) -> Result<SyslogServers, Diagnostics> {
        let [network_id] = parse_import_id(id, ["network_id"])?;
        Ok(SyslogServers {
            network_id,
            servers: Vec::new(),
        })
    }
}
