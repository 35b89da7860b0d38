use std::path::Path;

use anyhow::{Result, anyhow};
use log::info;

use crate::retry::Cancellation;
use crate::runtime::Runtime;
use crate::state::{Address, StateFile};

use super::{Services, check};

/// Delete the object at `address` remotely, then forget it
#[tracing::instrument(skip(runtime, services, cancel))]
pub async fn destroy<R: Runtime + ?Sized>(
    runtime: &R,
    services: &Services,
    cancel: &Cancellation,
    state_path: &Path,
    address: &str,
) -> Result<()> {
    let address: Address = address.parse()?;
    let resource = services.resource(&address.type_name)?;
    let mut state = StateFile::load(runtime, state_path)?;

    let current = state
        .get(&address)
        .ok_or_else(|| anyhow!("Resource {} is not in state.", address))?
        .attributes
        .clone();

    check(resource.delete(cancel, current).await, "destroy", &address)?;

    state.remove(&address);
    state.save(runtime, state_path)?;

    info!("Destroyed {}", address);
    println!("Destroy complete: {}", address);
    Ok(())
}
