//! Root hardware list and change notifications
//!
//! The hardware layer mutates the tree from its own context. Instead of calling
//! back into the logger, every attached change is published as a
//! [`TopologyEvent`] into each subscriber's bounded queue; the logger drains its
//! queue at the start of a tick.
//!
//! A full queue drops the event and flags the subscriber. The subscriber is
//! expected to resynchronise against the live tree on its next drain.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::hardware::Hardware;
use super::identifier::Identifier;
use super::sensor::Sensor;
use crate::constants::events;

/// A change below the hardware root
#[derive(Debug, Clone)]
pub enum TopologyEvent {
    HardwareAdded(Arc<Hardware>),
    HardwareRemoved(Arc<Hardware>),
    SensorAdded(Arc<Sensor>),
    SensorRemoved(Arc<Sensor>),
}

struct Subscriber {
    tx: mpsc::Sender<TopologyEvent>,
    overflowed: Arc<AtomicBool>,
}

/// Receiving end of a tree subscription
#[derive(Debug)]
pub struct TopologySubscription {
    rx: mpsc::Receiver<TopologyEvent>,
    overflowed: Arc<AtomicBool>,
}

impl TopologySubscription {
    /// Next queued event without waiting
    pub fn try_next(&mut self) -> Option<TopologyEvent> {
        self.rx.try_recv().ok()
    }

    /// Whether events were dropped since the last call; clears the flag
    pub fn take_overflow(&self) -> bool {
        self.overflowed.swap(false, Ordering::AcqRel)
    }
}

#[derive(Default)]
pub struct HardwareTree {
    roots: RwLock<Vec<Arc<Hardware>>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl HardwareTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tree pre-populated with roots; nothing is published for them
    pub fn with_roots(roots: Vec<Arc<Hardware>>) -> Self {
        Self {
            roots: RwLock::new(roots),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> TopologySubscription {
        self.subscribe_with_capacity(events::QUEUE_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, capacity: usize) -> TopologySubscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let overflowed = Arc::new(AtomicBool::new(false));
        self.subscribers.lock().push(Subscriber {
            tx,
            overflowed: overflowed.clone(),
        });
        TopologySubscription { rx, overflowed }
    }

    /// Snapshot of the root hardware list
    pub fn roots(&self) -> Vec<Arc<Hardware>> {
        self.roots.read().clone()
    }

    /// First root hardware, the mainboard by convention
    pub fn mainboard(&self) -> Option<Arc<Hardware>> {
        self.roots.read().first().cloned()
    }

    pub fn add_hardware(&self, hardware: Arc<Hardware>) {
        debug!(hardware = %hardware.identifier(), "Hardware added");
        self.roots.write().push(hardware.clone());
        self.publish(TopologyEvent::HardwareAdded(hardware));
    }

    pub fn remove_hardware(&self, identifier: &Identifier) -> Option<Arc<Hardware>> {
        let removed = {
            let mut roots = self.roots.write();
            let pos = roots.iter().position(|hw| hw.identifier() == identifier)?;
            roots.remove(pos)
        };
        debug!(hardware = %identifier, "Hardware removed");
        self.publish(TopologyEvent::HardwareRemoved(removed.clone()));
        Some(removed)
    }

    /// Nest `child` below `parent`; published only when `parent` is in the tree
    pub fn add_sub_hardware(&self, parent: &Arc<Hardware>, child: Arc<Hardware>) {
        parent.push_sub_hardware(child.clone());
        if self.contains(parent) {
            debug!(parent = %parent.identifier(), hardware = %child.identifier(), "Sub-hardware added");
            self.publish(TopologyEvent::HardwareAdded(child));
        }
    }

    pub fn remove_sub_hardware(
        &self,
        parent: &Arc<Hardware>,
        identifier: &Identifier,
    ) -> Option<Arc<Hardware>> {
        let child = parent.take_sub_hardware(identifier)?;
        if self.contains(parent) {
            debug!(parent = %parent.identifier(), hardware = %identifier, "Sub-hardware removed");
            self.publish(TopologyEvent::HardwareRemoved(child.clone()));
        }
        Some(child)
    }

    /// Attach a sensor to `hardware`; published only when `hardware` is in the tree
    pub fn add_sensor(&self, hardware: &Arc<Hardware>, sensor: Arc<Sensor>) {
        hardware.push_sensor(sensor.clone());
        if self.contains(hardware) {
            self.publish(TopologyEvent::SensorAdded(sensor));
        }
    }

    pub fn remove_sensor(
        &self,
        hardware: &Arc<Hardware>,
        identifier: &Identifier,
    ) -> Option<Arc<Sensor>> {
        let sensor = hardware.take_sensor(identifier)?;
        if self.contains(hardware) {
            self.publish(TopologyEvent::SensorRemoved(sensor.clone()));
        }
        Some(sensor)
    }

    /// Whether `hardware` is reachable from a root
    pub fn contains(&self, hardware: &Arc<Hardware>) -> bool {
        let mut stack: Vec<Arc<Hardware>> = self.roots();
        while let Some(hw) = stack.pop() {
            if Arc::ptr_eq(&hw, hardware) {
                return true;
            }
            stack.extend(hw.sub_hardware());
        }
        false
    }

    /// Visit every sensor below the roots, depth-first
    pub fn visit_sensors(&self, visit: impl FnMut(&Arc<Sensor>)) {
        visit_sensors(&self.roots(), visit);
    }

    /// Every sensor below the roots in traversal order
    pub fn sensors(&self) -> Vec<Arc<Sensor>> {
        let mut sensors = Vec::new();
        self.visit_sensors(|s| sensors.push(s.clone()));
        sensors
    }

    fn publish(&self, event: TopologyEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| match sub.tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("Topology event queue full, subscriber will resynchronise");
                sub.overflowed.store(true, Ordering::Release);
                true
            }
            Err(TrySendError::Closed(_)) => false,
        });
    }
}

/// Depth-first walk with an explicit stack: a node's own sensors in declared
/// order, then its sub-hardware in declared order.
pub fn visit_sensors(roots: &[Arc<Hardware>], mut visit: impl FnMut(&Arc<Sensor>)) {
    let mut stack: Vec<Arc<Hardware>> = roots.iter().rev().cloned().collect();
    while let Some(hw) = stack.pop() {
        for sensor in hw.sensors() {
            visit(&sensor);
        }
        stack.extend(hw.sub_hardware().into_iter().rev());
    }
}
