// ── Per-device sync state ──

use serde::{Deserialize, Serialize};

use super::device::Device;
use super::event::OpenEvent;

/// What the coordinator knows about one device after a poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub device: Device,
    pub last_event: Option<OpenEvent>,
    /// `false` once the last cycle could not confirm this device's data.
    pub available: bool,
}

impl DeviceState {
    pub fn new(device: Device, last_event: Option<OpenEvent>) -> Self {
        Self {
            device,
            last_event,
            available: true,
        }
    }
}
