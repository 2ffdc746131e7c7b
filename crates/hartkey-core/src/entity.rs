// ── Entity descriptors ──
//
// What a smart-home frontend would register per device: an open button
// for devices that support it and a pair of "last open" sensors. Values
// and availability are derived from the current snapshot; nothing here
// talks to the remote.

use serde::Serialize;

use crate::model::{DeviceClass, DeviceId, DeviceState};
use crate::store::RegistrySnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
    OpenButton,
    LastOpenSensor,
    LastOpenMethodSensor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityDescriptor {
    pub unique_id: String,
    pub device_id: DeviceId,
    pub kind: EntityKind,
    pub name: String,
    pub icon: &'static str,
    /// Model name of the owning device.
    pub model: &'static str,
    pub available: bool,
    /// Current sensor value. Always `None` for buttons.
    pub value: Option<String>,
}

/// Descriptors for one device, button first.
pub fn describe(state: &DeviceState) -> Vec<EntityDescriptor> {
    let device = &state.device;
    let model = device.class.model_name();
    let mut entities = Vec::with_capacity(3);

    if device.can_open {
        let (icon, label) = match device.class {
            DeviceClass::Gate => ("mdi:gate", "Open gate"),
            DeviceClass::Door | DeviceClass::Generic => ("mdi:door-open", "Open door"),
        };
        entities.push(EntityDescriptor {
            unique_id: format!("{}_open", device.id),
            device_id: device.id.clone(),
            kind: EntityKind::OpenButton,
            name: format!("{} {label}", device.name),
            icon,
            model,
            available: state.available,
            value: None,
        });
    }

    entities.push(EntityDescriptor {
        unique_id: format!("{}_last_open", device.id),
        device_id: device.id.clone(),
        kind: EntityKind::LastOpenSensor,
        name: format!("{} Last open", device.name),
        icon: "mdi:clock-outline",
        model,
        available: state.available,
        value: state.last_event.as_ref().map(|e| e.timestamp.to_rfc3339()),
    });

    entities.push(EntityDescriptor {
        unique_id: format!("{}_last_open_method", device.id),
        device_id: device.id.clone(),
        kind: EntityKind::LastOpenMethodSensor,
        name: format!("{} Last open method", device.name),
        icon: "mdi:key-variant",
        model,
        available: state.available,
        value: state.last_event.as_ref().map(|e| e.method.to_string()),
    });

    entities
}

/// Descriptors for every device in snapshot order.
pub fn describe_snapshot(snapshot: &RegistrySnapshot) -> Vec<EntityDescriptor> {
    snapshot.iter().flat_map(describe).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Device, OpenEvent, OpenMethod};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn state(id: &str, class: DeviceClass, can_open: bool) -> DeviceState {
        DeviceState::new(
            Device {
                id: DeviceId::from(id),
                name: "Yard".into(),
                class,
                can_open,
                firmware_version: None,
                serial_number: None,
            },
            None,
        )
    }

    #[test]
    fn gate_gets_gate_button_and_sensors() {
        let entities = describe(&state("9", DeviceClass::Gate, true));
        let ids: Vec<&str> = entities.iter().map(|e| e.unique_id.as_str()).collect();

        assert_eq!(ids, vec!["9_open", "9_last_open", "9_last_open_method"]);
        assert_eq!(entities[0].icon, "mdi:gate");
        assert_eq!(entities[0].name, "Yard Open gate");
        assert_eq!(entities[0].model, "Gate");
    }

    #[test]
    fn device_without_open_support_has_no_button() {
        let entities = describe(&state("3", DeviceClass::Door, false));
        assert!(entities.iter().all(|e| e.kind != EntityKind::OpenButton));
        assert_eq!(entities.len(), 2);
    }

    #[test]
    fn sensors_follow_last_event_and_availability() {
        let mut state = state("4", DeviceClass::Door, true);
        state.last_event = Some(OpenEvent {
            device_id: DeviceId::from("4"),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, 3, 0).unwrap(),
            method: OpenMethod::FaceRecognition,
            event_type: "face_open_remote".into(),
        });
        state.available = false;

        let entities = describe(&state);
        assert_eq!(entities[0].icon, "mdi:door-open");
        assert_eq!(entities[1].value.as_deref(), Some("2024-06-15T10:03:00+00:00"));
        assert_eq!(entities[2].value.as_deref(), Some("face_recognition"));
        assert!(entities.iter().all(|e| !e.available));
    }
}
