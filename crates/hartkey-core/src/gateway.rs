// ── Remote gateway abstraction ──
//
// The coordinator talks to the remote service through this trait so the
// scheduling logic can run against a scripted gateway in tests. The
// production implementation wraps `HartkeyClient` and converts wire types
// into domain types at the boundary.

use std::collections::HashSet;
use std::future::Future;

use hartkey_api::HartkeyClient;
use secrecy::SecretString;
use tracing::{debug, warn};

use crate::convert::device_from_raw;
use crate::error::CoreError;
use crate::model::{Device, DeviceId, OpenEvent};

/// The three remote operations the coordinator needs.
///
/// Implementations perform exactly one attempt per call and report
/// failures as classified [`CoreError`]s.
pub trait Gateway: Send + Sync + 'static {
    /// All devices on the account, in remote order.
    fn list_devices(
        &self,
        token: &SecretString,
    ) -> impl Future<Output = Result<Vec<Device>, CoreError>> + Send;

    /// Recent open events for one device, in any order.
    fn list_recent_events(
        &self,
        token: &SecretString,
        device_id: &DeviceId,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<OpenEvent>, CoreError>> + Send;

    /// Ask the remote to open the device's door or gate.
    fn trigger_open(
        &self,
        token: &SecretString,
        device_id: &DeviceId,
    ) -> impl Future<Output = Result<(), CoreError>> + Send;
}

impl Gateway for HartkeyClient {
    async fn list_devices(&self, token: &SecretString) -> Result<Vec<Device>, CoreError> {
        let raw = HartkeyClient::list_devices(self, token).await?;
        let total = raw.len();
        let devices: Vec<Device> = raw.into_iter().filter_map(device_from_raw).collect();
        if devices.len() != total {
            warn!(
                skipped = total - devices.len(),
                "ignoring devices without an id"
            );
        }
        Ok(devices)
    }

    async fn list_recent_events(
        &self,
        token: &SecretString,
        device_id: &DeviceId,
        limit: u32,
    ) -> Result<Vec<OpenEvent>, CoreError> {
        let raw = HartkeyClient::list_recent_events(self, token, device_id.as_str(), limit).await?;
        Ok(raw.into_iter().map(OpenEvent::from).collect())
    }

    async fn trigger_open(&self, token: &SecretString, device_id: &DeviceId) -> Result<(), CoreError> {
        HartkeyClient::open(self, token, device_id.as_str()).await?;
        Ok(())
    }
}

/// Drop devices whose id was already seen, keeping the first occurrence.
pub(crate) fn dedupe_devices(devices: Vec<Device>) -> Vec<Device> {
    let mut seen = HashSet::with_capacity(devices.len());
    devices
        .into_iter()
        .filter(|device| {
            let fresh = seen.insert(device.id.clone());
            if !fresh {
                warn!(device_id = %device.id, "duplicate device id in listing; keeping first");
            }
            fresh
        })
        .collect()
}

/// Check that `token` is accepted by listing devices once.
///
/// Touches no coordinator state. Returns the number of devices visible
/// to the token.
pub async fn validate_token<G: Gateway>(gateway: &G, token: &SecretString) -> Result<usize, CoreError> {
    let devices = gateway.list_devices(token).await?;
    debug!(devices = devices.len(), "token accepted");
    Ok(devices.len())
}
