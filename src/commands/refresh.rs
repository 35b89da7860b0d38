use std::path::Path;

use anyhow::{Result, anyhow};
use log::{debug, warn};

use crate::retry::Cancellation;
use crate::runtime::Runtime;
use crate::state::{Address, StateFile};

use super::{Services, check};

/// Re-read one or all instances, dropping those that no longer exist
#[tracing::instrument(skip(runtime, services, cancel))]
pub async fn refresh<R: Runtime + ?Sized>(
    runtime: &R,
    services: &Services,
    cancel: &Cancellation,
    state_path: &Path,
    address: Option<&str>,
) -> Result<()> {
    let mut state = StateFile::load(runtime, state_path)?;

    let addresses = match address {
        Some(address) => {
            let address: Address = address.parse()?;
            if state.get(&address).is_none() {
                return Err(anyhow!("Resource {} is not in state.", address));
            }
            vec![address]
        }
        None => state.addresses()?,
    };

    if addresses.is_empty() {
        println!("No resources in state.");
        return Ok(());
    }

    for address in &addresses {
        if let Err(err) = refresh_one(services, cancel, &mut state, address).await {
            // Keep what was refreshed before the failure.
            state.save(runtime, state_path)?;
            return Err(err);
        }
    }

    state.save(runtime, state_path)?;
    Ok(())
}

async fn refresh_one(
    services: &Services,
    cancel: &Cancellation,
    state: &mut StateFile,
    address: &Address,
) -> Result<()> {
    let resource = services.resource(&address.type_name)?;
    let current = state
        .get(address)
        .map(|entry| entry.attributes.clone())
        .ok_or_else(|| anyhow!("Resource {} is not in state.", address))?;

    debug!("Refreshing {}", address);
    match check(resource.read(cancel, current).await, "refresh", address)? {
        Some(refreshed) => {
            state.upsert(address, refreshed);
            println!("{}: refreshed", address);
        }
        None => {
            warn!("{} no longer exists remotely, removing it from state", address);
            state.remove(address);
            println!("{}: removed (no longer exists)", address);
        }
    }
    Ok(())
}
