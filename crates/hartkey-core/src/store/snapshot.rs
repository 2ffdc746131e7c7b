// ── Immutable registry snapshots and their diffs ──

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Serialize;

use crate::model::{Device, DeviceId, DeviceState};

/// The full set of known devices as of one poll cycle.
///
/// Never mutated after construction: readers hold an `Arc` to a snapshot
/// and always see a consistent view, whatever the writer is doing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrySnapshot {
    states: IndexMap<DeviceId, DeviceState>,
    taken_at: Option<DateTime<Utc>>,
}

impl RegistrySnapshot {
    /// Build a snapshot in the given order. On duplicate ids the first
    /// entry wins.
    pub fn new(states: impl IntoIterator<Item = DeviceState>) -> Self {
        let mut map = IndexMap::new();
        for state in states {
            if let Entry::Vacant(slot) = map.entry(state.device.id.clone()) {
                slot.insert(state);
            }
        }
        Self {
            states: map,
            taken_at: Some(Utc::now()),
        }
    }

    pub fn get(&self, id: &DeviceId) -> Option<&DeviceState> {
        self.states.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceState> {
        self.states.values()
    }

    pub fn devices(&self) -> impl Iterator<Item = &Device> {
        self.states.values().map(|s| &s.device)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// When the data in this snapshot was fetched. `None` before the
    /// first successful cycle.
    pub fn taken_at(&self) -> Option<DateTime<Utc>> {
        self.taken_at
    }

    /// Copy of this snapshot with every device flagged unavailable.
    /// Keeps `taken_at`: the data itself is no fresher.
    pub(crate) fn to_unavailable(&self) -> Self {
        let states = self
            .states
            .iter()
            .map(|(id, state)| {
                let mut state = state.clone();
                state.available = false;
                (id.clone(), state)
            })
            .collect();
        Self {
            states,
            taken_at: self.taken_at,
        }
    }

    /// Changes needed to go from `previous` to `self`.
    pub fn diff_from(&self, previous: &RegistrySnapshot) -> RegistryDiff {
        let mut diff = RegistryDiff::default();
        for (id, state) in &self.states {
            match previous.states.get(id) {
                None => diff.added.push(state.device.clone()),
                Some(old) if old != state => diff.updated.push(state.clone()),
                Some(_) => {}
            }
        }
        diff.removed = previous
            .states
            .keys()
            .filter(|id| !self.states.contains_key(*id))
            .cloned()
            .collect();
        diff
    }
}

/// Device-level changes between two snapshots.
///
/// A new device appears only in `added`; its state is in the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryDiff {
    pub added: Vec<Device>,
    pub updated: Vec<DeviceState>,
    pub removed: Vec<DeviceId>,
}

impl RegistryDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}
