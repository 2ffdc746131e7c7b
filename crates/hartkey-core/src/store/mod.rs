// ── Device registry ──
//
// Holds the current snapshot behind an atomic pointer. A poll cycle builds
// a complete new snapshot and swaps it in; readers never observe a
// half-applied cycle. Writes are serialized by the coordinator (only one
// poll cycle runs at a time), reads are lock-free.

mod snapshot;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use snapshot::{RegistryDiff, RegistrySnapshot};

pub struct Registry {
    current: ArcSwap<RegistrySnapshot>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(RegistrySnapshot::default()),
        }
    }

    /// The latest committed snapshot.
    pub fn current(&self) -> Arc<RegistrySnapshot> {
        self.current.load_full()
    }

    /// Commit `snapshot` and return what changed against the previous one.
    pub fn replace(&self, snapshot: RegistrySnapshot) -> RegistryDiff {
        let next = Arc::new(snapshot);
        let previous = self.current.swap(Arc::clone(&next));
        next.diff_from(&previous)
    }

    /// Flag every known device unavailable, keeping their last data.
    pub fn mark_unavailable(&self) -> RegistryDiff {
        let previous = self.current.load_full();
        let next = previous.to_unavailable();
        let diff = next.diff_from(&previous);
        if !diff.is_empty() {
            self.current.store(Arc::new(next));
        }
        diff
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Device, DeviceClass, DeviceId, DeviceState, OpenEvent, OpenMethod};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn device(id: &str) -> Device {
        Device {
            id: DeviceId::from(id),
            name: format!("Door {id}"),
            class: DeviceClass::Door,
            can_open: true,
            firmware_version: None,
            serial_number: None,
        }
    }

    fn opened(id: &str, minute: u32) -> OpenEvent {
        OpenEvent {
            device_id: DeviceId::from(id),
            timestamp: Utc.with_ymd_and_hms(2024, 6, 15, 10, minute, 0).unwrap(),
            method: OpenMethod::Rfid,
            event_type: "rfid_open_local".into(),
        }
    }

    #[test]
    fn first_snapshot_reports_additions_only() {
        let registry = Registry::new();
        let diff = registry.replace(RegistrySnapshot::new([
            DeviceState::new(device("a"), None),
            DeviceState::new(device("b"), None),
        ]));

        assert_eq!(diff.added, vec![device("a"), device("b")]);
        assert!(diff.updated.is_empty() && diff.removed.is_empty());
        assert_eq!(registry.current().len(), 2);
    }

    #[test]
    fn diff_reports_updates_and_removals() {
        let registry = Registry::new();
        registry.replace(RegistrySnapshot::new([
            DeviceState::new(device("a"), None),
            DeviceState::new(device("b"), None),
        ]));

        let diff = registry.replace(RegistrySnapshot::new([DeviceState::new(
            device("a"),
            Some(opened("a", 3)),
        )]));

        assert!(diff.added.is_empty());
        assert_eq!(diff.updated.len(), 1);
        assert_eq!(diff.updated[0].last_event, Some(opened("a", 3)));
        assert_eq!(diff.removed, vec![DeviceId::from("b")]);
        assert!(registry.current().get(&DeviceId::from("b")).is_none());
    }

    #[test]
    fn unchanged_snapshot_yields_empty_diff() {
        let registry = Registry::new();
        let states = [DeviceState::new(device("a"), Some(opened("a", 1)))];
        registry.replace(RegistrySnapshot::new(states.clone()));
        assert!(registry.replace(RegistrySnapshot::new(states)).is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut renamed = device("a");
        renamed.name = "Shadow".into();
        let snapshot = RegistrySnapshot::new([
            DeviceState::new(device("a"), None),
            DeviceState::new(renamed, None),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(&DeviceId::from("a")).unwrap().device.name, "Door a");
    }

    #[test]
    fn mark_unavailable_keeps_data_and_swaps_whole_snapshot() {
        let registry = Registry::new();
        registry.replace(RegistrySnapshot::new([DeviceState::new(
            device("a"),
            Some(opened("a", 5)),
        )]));
        let before = registry.current();

        let diff = registry.mark_unavailable();
        let after = registry.current();

        assert_eq!(diff.updated.len(), 1);
        assert!(!Arc::ptr_eq(&before, &after));
        assert!(before.get(&DeviceId::from("a")).unwrap().available);

        let state = after.get(&DeviceId::from("a")).unwrap();
        assert!(!state.available);
        assert_eq!(state.last_event, Some(opened("a", 5)));
        assert_eq!(after.taken_at(), before.taken_at());

        assert!(registry.mark_unavailable().is_empty(), "already unavailable");
    }
}
