use std::path::Path;

use anyhow::Result;

use crate::retry::Cancellation;
use crate::runtime::Runtime;

use super::{Services, check, read_json};

/// Read a data source and print the result as JSON
#[tracing::instrument(skip(runtime, services, cancel))]
pub async fn data<R: Runtime + ?Sized>(
    runtime: &R,
    services: &Services,
    cancel: &Cancellation,
    type_name: &str,
    config_path: &Path,
) -> Result<()> {
    let data_source = services.data_source(type_name)?;
    let config = read_json(runtime, config_path)?;

    let result = check(data_source.read(cancel, config).await, "read", type_name)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
