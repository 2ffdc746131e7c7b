// ── Open event domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::DeviceId;

/// How a door or gate was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OpenMethod {
    /// Remote open through the API (app, this integration).
    Api,
    FaceRecognition,
    /// Remote PIN or local keypad code.
    PinCode,
    Rfid,
    Other,
}

impl OpenMethod {
    /// Map a remote `event_type`.
    pub fn from_event_type(event_type: &str) -> Self {
        match event_type {
            "api_open_remote" => Self::Api,
            "face_open_remote" => Self::FaceRecognition,
            "pin_code_open_remote" | "code_open_local" => Self::PinCode,
            "rfid_open_local" => Self::Rfid,
            _ => Self::Other,
        }
    }
}

/// A recorded door/gate opening. Immutable once observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenEvent {
    pub device_id: DeviceId,
    pub timestamp: DateTime<Utc>,
    pub method: OpenMethod,
    /// Raw remote event type, kept for diagnostics.
    pub event_type: String,
}

impl OpenEvent {
    pub fn is_newer_than(&self, other: &OpenEvent) -> bool {
        self.timestamp > other.timestamp
    }
}

/// Pick the more recent of two optional events. On equal timestamps the
/// cached one wins so a re-delivered event does not register as a change.
pub fn newer_event(cached: Option<OpenEvent>, fetched: Option<OpenEvent>) -> Option<OpenEvent> {
    match (cached, fetched) {
        (Some(cached), Some(fetched)) => {
            if fetched.is_newer_than(&cached) {
                Some(fetched)
            } else {
                Some(cached)
            }
        }
        (cached, fetched) => cached.or(fetched),
    }
}

/// The most recent event in `events`, regardless of input order.
pub fn latest_event(events: impl IntoIterator<Item = OpenEvent>) -> Option<OpenEvent> {
    events.into_iter().max_by_key(|e| e.timestamp)
}
