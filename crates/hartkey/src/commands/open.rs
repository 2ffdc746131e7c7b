//! Open command handler.

use hartkey_core::CloudCoordinator;

use crate::cli::{GlobalOpts, OpenArgs};
use crate::error::CliError;

use super::util;

pub async fn handle(
    coordinator: &CloudCoordinator,
    args: OpenArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sync_once(coordinator).await?;
    let snapshot = coordinator.current_snapshot();
    let device_id = util::resolve_device_id(&snapshot, &args.device)?;

    coordinator.trigger_open(&device_id).await?;

    if !global.quiet {
        let name = snapshot
            .get(&device_id)
            .map_or_else(|| device_id.to_string(), |s| s.device.name.clone());
        eprintln!("Open command sent to {name}");
    }
    Ok(())
}
