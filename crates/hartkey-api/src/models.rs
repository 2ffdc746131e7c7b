// Wire types for the Hartkey cloud API.
//
// Both services wrap their payload in a `{ "data": { ... } }` envelope.
// Identifiers arrive as JSON numbers on some firmware and as strings on
// others, so they are normalized to `String` at the edge.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Device types that expose a door/gate actuator.
pub const DEVICE_TYPE_INTERCOM: &str = "intercom";
pub const DEVICE_TYPE_GATE: &str = "gate";

/// Capability name advertised by devices that can be opened remotely.
pub const CAPABILITY_OPEN_DOOR: &str = "open_door";

/// Event types that represent a door/gate being opened.
pub const OPEN_EVENT_TYPES: [&str; 6] = [
    "api_open_remote",
    "face_open_remote",
    "pin_code_open_remote",
    "code_open_local",
    "rfid_open_local",
    "dtmf_open_local",
];

// ── Devices ──────────────────────────────────────────────────────────

/// `GET devices/intercom` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct DevicesResponse {
    pub data: DevicesData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DevicesData {
    pub devices: Vec<RawDevice>,
}

/// A device as reported by the household service.
///
/// Unknown fields are kept in `extra` so nothing is silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDevice {
    #[serde(default, deserialize_with = "opt_id")]
    pub id: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    #[serde(default)]
    pub name_by_company: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
    #[serde(default)]
    pub firmware_version: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capability {
    pub name: String,
    #[serde(default)]
    pub setup: Option<bool>,
}

impl RawDevice {
    /// First non-empty name among description, user-assigned and
    /// company-assigned names.
    pub fn display_name(&self) -> Option<&str> {
        [
            self.description.as_deref(),
            self.name_by_user.as_deref(),
            self.name_by_company.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|name| !name.is_empty())
    }

    /// Whether the named capability is present *and* configured.
    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.name == name && c.setup == Some(true))
    }
}

// ── Events ───────────────────────────────────────────────────────────

/// `GET events/list` response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct EventsResponse {
    pub data: EventsData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventsData {
    pub items: Vec<RawEvent>,
}

/// A single event from the events service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(deserialize_with = "id")]
    pub device_id: String,
    pub event_type: String,
    pub raised_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

// ── Identifier normalization ─────────────────────────────────────────

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Str(String),
    Int(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Str(s) => s,
            RawId::Int(n) => n.to_string(),
        }
    }
}

fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    RawId::deserialize(deserializer).map(String::from)
}

fn opt_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<RawId>::deserialize(deserializer)?
        .map(String::from)
        .filter(|s| !s.is_empty()))
}
