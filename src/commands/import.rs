use std::path::Path;

use anyhow::{Result, bail};
use log::debug;

use crate::retry::Cancellation;
use crate::runtime::Runtime;
use crate::state::{Address, StateFile};

use super::{Services, check};

/// Bring an existing Dashboard object under management at `address`
#[tracing::instrument(skip(runtime, services, cancel))]
pub async fn import<R: Runtime + ?Sized>(
    runtime: &R,
    services: &Services,
    cancel: &Cancellation,
    state_path: &Path,
    address: &str,
    import_id: &str,
) -> Result<()> {
    let address: Address = address.parse()?;
    let resource = services.resource(&address.type_name)?;
    let mut state = StateFile::load(runtime, state_path)?;

    if state.get(&address).is_some() {
        bail!(
            "Resource {} already exists in state. Remove it with destroy before importing.",
            address
        );
    }

    let partial = check(resource.import_state(import_id), "import", &address)?;
    debug!("Reading {} with identity {}", address, partial);

    let imported = check(resource.read(cancel, partial).await, "import", &address)?;
    let Some(imported) = imported else {
        bail!(
            "Cannot import non-existent remote object: {} (import ID \"{}\")",
            address,
            import_id
        );
    };

    state.upsert(&address, imported);
    state.save(runtime, state_path)?;

    println!("Import successful: {}", address);
    Ok(())
}
