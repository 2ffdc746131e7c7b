//! Shared helpers for command handlers.

use std::sync::Arc;

use hartkey_core::{CloudCoordinator, DeviceId, RegistrySnapshot, SyncUpdate};

use crate::error::CliError;

/// Run one poll cycle and fail if it did not succeed.
pub async fn sync_once(coordinator: &CloudCoordinator) -> Result<Arc<SyncUpdate>, CliError> {
    let update = coordinator.refresh().await?;
    match update.error {
        Some(kind) => Err(CliError::from_sync_failure(kind)),
        None => Ok(update),
    }
}

/// Resolve a device identifier (ID, or case-insensitive name) via
/// snapshot lookup. An exact ID always wins over a name.
pub fn resolve_device_id(
    snapshot: &RegistrySnapshot,
    identifier: &str,
) -> Result<DeviceId, CliError> {
    let by_id = DeviceId::from(identifier);
    if snapshot.get(&by_id).is_some() {
        return Ok(by_id);
    }

    let mut matches = snapshot
        .devices()
        .filter(|d| d.name.eq_ignore_ascii_case(identifier));
    match (matches.next(), matches.next()) {
        (Some(device), None) => Ok(device.id.clone()),
        (Some(_), Some(_)) => Err(CliError::Validation {
            field: "device".into(),
            reason: format!("'{identifier}' matches several devices; use the device ID"),
        }),
        (None, _) => Err(CliError::NotFound {
            identifier: identifier.into(),
        }),
    }
}
