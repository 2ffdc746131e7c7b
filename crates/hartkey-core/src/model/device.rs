// ── Device domain types ──

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of a remote device.
///
/// The remote API uses numeric ids on some endpoints and strings on
/// others; the canonical form is always the string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// What the device physically controls.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DeviceClass {
    /// Apartment/entrance intercom with a door lock.
    Door,
    /// Yard or parking gate.
    Gate,
    /// Any other intercom panel without a known actuator.
    Generic,
}

impl DeviceClass {
    /// Map the remote `device_type` string.
    pub fn from_device_type(device_type: Option<&str>) -> Self {
        match device_type {
            Some(hartkey_api::models::DEVICE_TYPE_INTERCOM) => Self::Door,
            Some(hartkey_api::models::DEVICE_TYPE_GATE) => Self::Gate,
            _ => Self::Generic,
        }
    }

    /// Whether devices of this class have something that can be opened.
    pub fn has_actuator(self) -> bool {
        matches!(self, Self::Door | Self::Gate)
    }

    /// Human-readable model name for device registries.
    pub fn model_name(self) -> &'static str {
        match self {
            Self::Door => "Intercom",
            Self::Gate => "Gate",
            Self::Generic => "Device",
        }
    }
}

/// A remote intercom or gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub class: DeviceClass,
    /// Remote opening is both supported and configured for this device.
    pub can_open: bool,
    pub firmware_version: Option<String>,
    pub serial_number: Option<String>,
}
