//! Local state file: the last known attributes of every managed resource
//! instance, keyed by address.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::runtime::Runtime;

pub const STATE_VERSION: u32 = 1;
pub const DEFAULT_STATE_FILE: &str = "meraki.tfstate.json";

/// `<type>.<name>`, e.g. `meraki_networks_appliance_vlans.voice`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Address {
    pub type_name: String,
    pub name: String,
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.type_name, self.name)
    }
}

impl FromStr for Address {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            Err(anyhow!(
                "Invalid resource address '{}'. Expected '<type>.<name>'.",
                s
            ))
        } else {
            Ok(Address {
                type_name: parts[0].to_string(),
                name: parts[1].to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(rename = "type")]
    pub type_name: String,
    pub attributes: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFile {
    pub version: u32,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            resources: BTreeMap::new(),
        }
    }
}

impl StateFile {
    /// Loads the state at `path`. A missing file is an empty state.
    #[tracing::instrument(skip(runtime))]
    pub fn load<R: Runtime + ?Sized>(runtime: &R, path: &Path) -> Result<Self> {
        if !runtime.exists(path) {
            debug!("No state file at {:?}, starting empty", path);
            return Ok(Self::default());
        }

        let content = runtime.read_to_string(path)?;
        let state: StateFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {:?}", path))?;
        if state.version != STATE_VERSION {
            bail!(
                "Unsupported state file version {} in {:?} (expected {})",
                state.version,
                path,
                STATE_VERSION
            );
        }

        debug!("Loaded {} resource(s) from {:?}", state.resources.len(), path);
        Ok(state)
    }

    /// Writes `<path>.tmp`, then renames it over `path`.
    #[tracing::instrument(skip(self, runtime))]
    pub fn save<R: Runtime + ?Sized>(&self, runtime: &R, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        let tmp = tmp_path(path);

        runtime
            .write(&tmp, content.as_bytes())
            .with_context(|| format!("Failed to save state to {:?}", path))?;
        runtime.rename(&tmp, path)?;

        debug!("Saved {} resource(s) to {:?}", self.resources.len(), path);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceState> {
        self.resources.get(&address.to_string())
    }

    pub fn upsert(&mut self, address: &Address, attributes: Value) {
        self.resources.insert(
            address.to_string(),
            ResourceState {
                type_name: address.type_name.clone(),
                attributes,
            },
        );
    }

    pub fn remove(&mut self, address: &Address) -> Option<ResourceState> {
        self.resources.remove(&address.to_string())
    }

    /// All addresses in state, sorted.
    pub fn addresses(&self) -> Result<Vec<Address>> {
        self.resources.keys().map(|key| key.parse()).collect()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    PathBuf::from(tmp)
}
