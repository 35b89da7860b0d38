//! Dashboard resources and data sources.
//!
//! Each module pairs a state model (snake_case, what the user writes and
//! what lands in the state file) with the camelCase request/response shapes
//! of the Dashboard API, and maps between them.

mod appliance_vlan;
mod networks;
mod policy_object;
mod syslog_servers;

pub use appliance_vlan::{ApplianceVlan, ApplianceVlanResource, ReservedIpRange};
pub use networks::{Network, Networks, NetworksConfig, NetworksDataSource};
pub use policy_object::{PolicyObject, PolicyObjectResource};
pub use syslog_servers::{SyslogServer, SyslogServers, SyslogServersResource};

use crate::http::ApiError;
use crate::provider::Diagnostics;

/// The Dashboard API is inconsistent about whether some identifiers and
/// ports are JSON strings or numbers.
pub(crate) mod lenient {
    use serde::{Deserialize, Deserializer, de::Error};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(serde_json::Number),
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(
            Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
                StringOrNumber::String(s) => s,
                StringOrNumber::Number(n) => n.to_string(),
            }),
        )
    }

    pub fn port<'de, D>(deserializer: D) -> Result<u16, D::Error>
    where
        D: Deserializer<'de>,
    {
        match StringOrNumber::deserialize(deserializer)? {
            StringOrNumber::String(s) => s.trim().parse().map_err(D::Error::custom),
            StringOrNumber::Number(n) => n
                .as_u64()
                .and_then(|n| u16::try_from(n).ok())
                .ok_or_else(|| D::Error::custom(format!("invalid port {}", n))),
        }
    }
}

/// Diagnostic for a required attribute left unset in the plan.
fn missing_attribute(type_name: &str, attribute: &str) -> Diagnostics {
    Diagnostics::error(
        "Missing Required Attribute",
        format!("{} requires `{}` to be set.", type_name, attribute),
    )
}

/// Checks an identifier that becomes a URL path segment.
///
/// Dashboard IDs are made of letters, digits, `-` and `_`. Anything else
/// (`/`, `?`, `#`, `%`, dots) could address a different endpoint.
fn path_segment<'a>(
    type_name: &str,
    attribute: &str,
    value: &'a str,
) -> Result<&'a str, Diagnostics> {
    if value.is_empty() {
        return Err(missing_attribute(type_name, attribute));
    }
    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Diagnostics::error(
            "Invalid Attribute Value",
            format!(
                "`{}` may only contain letters, digits, '-' and '_'. Got: {:?}",
                attribute, value
            ),
        ));
    }
    Ok(value)
}

/// Diagnostic for a plan that changes an identifying attribute in place.
fn requires_replacement(attribute: &str, from: &str, to: &str) -> Diagnostics {
    Diagnostics::error(
        "Attribute Requires Replacement",
        format!(
            "`{}` cannot be changed in place ({:?} -> {:?}). Destroy and re-create the resource.",
            attribute, from, to
        ),
    )
}

/// Maps the outcome of a delete: an object that is already gone counts as
/// deleted.
///
/// 404 is a 4xx, so the retry helper has already spent its retries on it by
/// the time it lands here.
fn deleted(result: Result<(), ApiError>, summary: &str) -> Result<(), Diagnostics> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_not_found() => {
            log::debug!(
                "{}: still 404 after retries, treating the object as already gone",
                summary
            );
            Ok(())
        }
        Err(err) => Err(Diagnostics::from_api_error(summary, &err)),
    }
}
