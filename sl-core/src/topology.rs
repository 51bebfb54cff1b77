//! Slot-stable view of a changing sensor set
//!
//! A column log fixes its columns when the file is created: slot `i` always
//! names the same sensor identifier for the life of that file. Hardware that
//! disappears leaves its slots empty, and hardware that comes back with the same
//! identifiers refills them.
//!
//! Tree changes arrive as [`TopologyEvent`]s on a bounded queue. The queue and
//! the slot layout share one mutex; every read of the layout drains the queue
//! first, so a snapshot always reflects every change published before it.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::hw::{visit_sensors, HardwareTree, Sensor, TopologyEvent, TopologySubscription};

/// Ordered slots plus the identifier each slot was assigned
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    identifiers: Vec<String>,
    slots: Vec<Option<Arc<Sensor>>>,
}

impl TopologySnapshot {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn identifiers(&self) -> &[String] {
        &self.identifiers
    }

    pub fn slots(&self) -> &[Option<Arc<Sensor>>] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&Arc<Sensor>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// `(identifier, live sensor)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Arc<Sensor>>)> {
        self.identifiers
            .iter()
            .map(String::as_str)
            .zip(self.slots.iter().map(Option::as_ref))
    }

    /// Current reading of every slot; empty slots and unmeasured sensors are `None`
    pub fn values(&self) -> Vec<Option<f32>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().and_then(|s| s.value()))
            .collect()
    }
}

#[derive(Debug)]
struct SlotLayout {
    identifiers: Vec<String>,
    slots: Vec<Option<Arc<Sensor>>>,
}

impl SlotLayout {
    fn from_sensors(sensors: Vec<Arc<Sensor>>) -> Self {
        let identifiers = sensors.iter().map(|s| s.identifier().to_string()).collect();
        let slots = sensors.into_iter().map(Some).collect();
        Self { identifiers, slots }
    }

    fn from_identifiers(identifiers: Vec<String>) -> Self {
        let slots = vec![None; identifiers.len()];
        Self { identifiers, slots }
    }

    /// Place `sensor` in every slot recorded under its identifier
    fn fill(&mut self, sensor: &Arc<Sensor>) {
        for (id, slot) in self.identifiers.iter().zip(self.slots.iter_mut()) {
            if sensor.identifier() == id {
                trace!(sensor = %id, "Slot filled");
                *slot = Some(sensor.clone());
            }
        }
    }

    fn clear(&mut self, sensor: &Arc<Sensor>) {
        for (id, slot) in self.identifiers.iter().zip(self.slots.iter_mut()) {
            if sensor.identifier() == id {
                trace!(sensor = %id, "Slot cleared");
                *slot = None;
            }
        }
    }

    fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            identifiers: self.identifiers.clone(),
            slots: self.slots.clone(),
        }
    }
}

struct TopologyState {
    events: TopologySubscription,
    layout: Option<SlotLayout>,
}

pub struct SensorTopology {
    tree: Arc<HardwareTree>,
    state: Mutex<TopologyState>,
}

impl SensorTopology {
    /// Subscribe to `tree`; no layout exists until the first refresh
    pub fn new(tree: Arc<HardwareTree>) -> Self {
        let events = tree.subscribe();
        Self {
            tree,
            state: Mutex::new(TopologyState { events, layout: None }),
        }
    }

    pub fn tree(&self) -> &Arc<HardwareTree> {
        &self.tree
    }

    /// Apply queued changes, establish a layout from the full tree if none
    /// exists yet, and return the current slots.
    pub fn refresh(&self) -> TopologySnapshot {
        let mut state = self.state.lock();
        self.drain(&mut state);
        if state.layout.is_none() {
            state.layout = Some(self.enumerate_layout());
        }
        state
            .layout
            .as_ref()
            .map(SlotLayout::snapshot)
            .unwrap_or_default()
    }

    /// Apply queued changes without establishing anything
    pub fn apply_pending(&self) -> usize {
        let mut state = self.state.lock();
        self.drain(&mut state)
    }

    /// Fix a fresh layout from a full depth-first enumeration
    pub fn establish_from_tree(&self) -> TopologySnapshot {
        let mut state = self.state.lock();
        self.drain(&mut state);
        let layout = self.enumerate_layout();
        let snapshot = layout.snapshot();
        state.layout = Some(layout);
        snapshot
    }

    /// Fix a layout from an existing identifier ordering (a log header) and
    /// fill it with whatever live sensors match. Live sensors with no column
    /// stay out of this layout.
    pub fn adopt_identifiers(&self, identifiers: Vec<String>) -> TopologySnapshot {
        let mut state = self.state.lock();
        self.drain(&mut state);
        let mut layout = SlotLayout::from_identifiers(identifiers);
        self.tree.visit_sensors(|s| layout.fill(s));
        debug!(
            slots = layout.slots.len(),
            live = layout.slots.iter().filter(|s| s.is_some()).count(),
            "Adopted existing slot layout"
        );
        let snapshot = layout.snapshot();
        state.layout = Some(layout);
        snapshot
    }

    /// Drop the layout; the next establishment decides the new one
    pub fn reset(&self) {
        self.state.lock().layout = None;
    }

    /// Current slots, if a layout exists
    pub fn snapshot(&self) -> Option<TopologySnapshot> {
        let mut state = self.state.lock();
        self.drain(&mut state);
        state.layout.as_ref().map(SlotLayout::snapshot)
    }

    pub fn layout_len(&self) -> Option<usize> {
        self.state.lock().layout.as_ref().map(|l| l.slots.len())
    }

    /// Fresh depth-first sensor list, independent of any layout
    pub fn enumerate(&self) -> Vec<Arc<Sensor>> {
        self.tree.sensors()
    }

    fn enumerate_layout(&self) -> SlotLayout {
        let layout = SlotLayout::from_sensors(self.tree.sensors());
        debug!(slots = layout.slots.len(), "Established slot layout from hardware tree");
        layout
    }

    fn drain(&self, state: &mut TopologyState) -> usize {
        let overflowed = state.events.take_overflow();
        let mut applied = 0;
        while let Some(event) = state.events.try_next() {
            applied += 1;
            // Without a layout there is nothing to update; establishment walks
            // the whole tree.
            let Some(layout) = state.layout.as_mut() else {
                continue;
            };
            match event {
                TopologyEvent::HardwareAdded(hw) => visit_sensors(&[hw], |s| layout.fill(s)),
                TopologyEvent::HardwareRemoved(hw) => visit_sensors(&[hw], |s| layout.clear(s)),
                TopologyEvent::SensorAdded(sensor) => layout.fill(&sensor),
                TopologyEvent::SensorRemoved(sensor) => layout.clear(&sensor),
            }
        }

        if overflowed {
            if let Some(layout) = state.layout.as_mut() {
                warn!("Topology events were dropped, resynchronising slots with the tree");
                layout.slots.iter_mut().for_each(|slot| *slot = None);
                self.tree.visit_sensors(|s| layout.fill(s));
            }
        }
        applied
    }
}
