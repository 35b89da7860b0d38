use std::path::Path;

use anyhow::Result;
use log::{debug, info};

use crate::retry::Cancellation;
use crate::runtime::Runtime;
use crate::state::{Address, StateFile};

use super::{Services, check, read_json, report};

/// Create or update the resource at `address` from the plan in `plan_path`
#[tracing::instrument(skip(runtime, services, cancel))]
pub async fn apply<R: Runtime + ?Sized>(
    runtime: &R,
    services: &Services,
    cancel: &Cancellation,
    state_path: &Path,
    address: &str,
    plan_path: &Path,
) -> Result<()> {
    let address: Address = address.parse()?;
    let resource = services.resource(&address.type_name)?;
    let plan = read_json(runtime, plan_path)?;
    report(resource.validate(&plan), "validate", &address)?;
    let mut state = StateFile::load(runtime, state_path)?;

    let (new_state, action) = match state.get(&address) {
        Some(current) => {
            debug!("{} exists in state, updating", address);
            let result = resource
                .update(cancel, plan, current.attributes.clone())
                .await;
            (check(result, "update", &address)?, "updated")
        }
        None => {
            debug!("{} not in state, creating", address);
            let result = resource.create(cancel, plan).await;
            (check(result, "create", &address)?, "created")
        }
    };

    state.upsert(&address, new_state);
    state.save(runtime, state_path)?;

    info!("{} {}", address, action);
    println!("Apply complete: {} {}.", address, action);
    Ok(())
}
