// ── API-to-domain type conversions ──
//
// Bridges raw `hartkey_api` wire types into canonical `hartkey_core::model`
// types: picks display names, decides whether a device can be opened and
// maps event types onto open methods.

use hartkey_api::models::CAPABILITY_OPEN_DOOR;
use hartkey_api::{RawDevice, RawEvent};

use crate::model::{Device, DeviceClass, DeviceId, OpenEvent, OpenMethod};

/// Convert a wire device. Devices without an id cannot be tracked and
/// yield `None`.
pub(crate) fn device_from_raw(raw: RawDevice) -> Option<Device> {
    let id = raw.id.clone()?;
    let class = DeviceClass::from_device_type(raw.device_type.as_deref());
    let can_open = class.has_actuator() && raw.has_capability(CAPABILITY_OPEN_DOOR);
    let name = raw
        .display_name()
        .map_or_else(|| format!("Intercom {id}"), str::to_owned);

    Some(Device {
        id: DeviceId::from(id),
        name,
        class,
        can_open,
        firmware_version: raw.firmware_version,
        serial_number: raw.serial_number,
    })
}

impl From<RawEvent> for OpenEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            device_id: DeviceId::from(raw.device_id),
            timestamp: raw.raised_at,
            method: OpenMethod::from_event_type(&raw.event_type),
            event_type: raw.event_type,
        }
    }
}
