//! CLI command implementations.
//!
//! Every command loads the state file, talks to the Dashboard through the
//! registry in [`Services`], and persists the result.

use std::fmt::Display;
use std::path::Path;

use anyhow::{Context, Result};
use log::warn;
use serde_json::Value;

use crate::provider::Diagnostics;
use crate::runtime::Runtime;

mod apply;
mod data;
mod destroy;
mod import;
mod refresh;
mod services;
mod show;

pub use apply::apply;
pub use data::data;
pub use destroy::destroy;
pub use import::import;
pub use refresh::refresh;
pub use services::Services;
pub use show::{render_state, show};

/// Turns provider diagnostics into an error naming the failed operation.
/// Warnings are logged.
fn check<T>(result: Result<T, Diagnostics>, operation: &str, target: impl Display) -> Result<T> {
    result.map_err(|diags| {
        log_warnings(&diags, &target);
        anyhow::Error::new(diags).context(format!("Failed to {} {}", operation, target))
    })
}

/// Logs the warnings in `diags` and fails if it holds any error.
fn report(diags: Diagnostics, operation: &str, target: impl Display) -> Result<()> {
    if diags.has_error() {
        check(Err(diags), operation, target)
    } else {
        log_warnings(&diags, &target);
        Ok(())
    }
}

fn log_warnings(diags: &Diagnostics, target: &impl Display) {
    for warning in diags.warnings() {
        warn!("{}: {}: {}", target, warning.summary, warning.detail);
    }
}

/// Reads a JSON document (plan or data source configuration) from disk.
fn read_json<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Value> {
    let content = runtime.read_to_string(path)?;
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {:?}", path))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use std::path::Path;

    #[test]
    fn test_check_wraps_diagnostics() {
        let mut diags = Diagnostics::error("Failed to create VLAN", "HTTP 400");
        diags.add_warning("Deprecated attribute", "dns_nameservers is ignored");

        let err = check::<()>(Err(diags), "create", "meraki_networks_appliance_vlans.voice")
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to create meraki_networks_appliance_vlans.voice"
        );
        assert!(format!("{:#}", err).contains("HTTP 400"));
    }

    #[test_log::test]
    fn test_report_passes_warnings_and_fails_on_errors() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Computed Attribute Ignored", "`interface_id` is set by the API");
        assert!(report(diags.clone(), "validate", "meraki_networks_appliance_vlans.voice").is_ok());

        diags.add_error("Invalid Attribute Value", "`vlan_id` is malformed");
        let err = report(diags, "validate", "meraki_networks_appliance_vlans.voice").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to validate meraki_networks_appliance_vlans.voice"
        );
        assert!(format!("{:#}", err).contains("`vlan_id` is malformed"));
    }

    #[test]
    fn test_read_json_reports_path() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_read_to_string()
            .returning(|_| Ok("{ broken".to_string()));

        let err = read_json(&runtime, Path::new("/work/plan.json")).unwrap_err();

        assert!(err.to_string().contains("plan.json"));
    }
}
