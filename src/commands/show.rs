use std::path::Path;

use anyhow::{Result, anyhow};
use log::debug;

use crate::runtime::Runtime;
use crate::state::{Address, StateFile};

/// Print the state file, or the attributes of one instance
#[tracing::instrument(skip(runtime))]
pub fn show<R: Runtime + ?Sized>(runtime: &R, state_path: &Path, address: Option<&str>) -> Result<()> {
    debug!("Showing state from {:?}", state_path);
    let state = StateFile::load(runtime, state_path)?;
    println!("{}", render_state(&state, address)?);
    Ok(())
}

/// Pretty JSON for the whole state, or for the instance at `address`.
pub fn render_state(state: &StateFile, address: Option<&str>) -> Result<String> {
    let rendered = match address {
        Some(address) => {
            let address: Address = address.parse()?;
            let entry = state
                .get(&address)
                .ok_or_else(|| anyhow!("Resource {} is not in state.", address))?;
            serde_json::to_string_pretty(&entry.attributes)?
        }
        None => serde_json::to_string_pretty(state)?,
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use serde_json::{Value, json};

    fn state() -> StateFile {
        let mut state = StateFile::default();
        state.upsert(
            &"meraki_networks_syslog_servers.main".parse().unwrap(),
            json!({"network_id": "N_1", "servers": []}),
        );
        state
    }

    #[test]
    fn test_render_whole_state() {
        let rendered: Value = serde_json::from_str(&render_state(&state(), None).unwrap()).unwrap();

        assert_eq!(rendered["version"], 1);
        assert_eq!(
            rendered["resources"]["meraki_networks_syslog_servers.main"]["attributes"]["network_id"],
            "N_1"
        );
    }

    #[test]
    fn test_render_single_address() {
        let rendered = render_state(&state(), Some("meraki_networks_syslog_servers.main")).unwrap();
        let attributes: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(attributes, json!({"network_id": "N_1", "servers": []}));
    }

    #[test]
    fn test_render_missing_address() {
        let err = render_state(&state(), Some("meraki_networks_syslog_servers.other")).unwrap_err();
        assert!(err.to_string().contains("is not in state"));

        assert!(render_state(&state(), Some("garbage")).is_err());
    }

    #[test]
    fn test_show_without_state_file() {
        let mut runtime = MockRuntime::new();
        runtime.expect_exists().returning(|_| false);

        assert!(show(&runtime, Path::new("/work/state.json"), None).is_ok());
    }
}
