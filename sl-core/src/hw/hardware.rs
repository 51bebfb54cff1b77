//! Hardware nodes of the tree
//!
//! A node owns its sensors and sub-hardware. Building a node (and its subtree)
//! before handing it to [`HardwareTree::add_hardware`](super::HardwareTree::add_hardware)
//! does not publish anything; once attached, changes go through the tree so
//! subscribers hear about them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::identifier::Identifier;
use super::sensor::{Sensor, SensorKind};
use crate::error::Result;

/// Hardware class. The slug is the hardware-kind segment of identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HardwareKind {
    Mainboard,
    SuperIo,
    Cpu,
    Memory,
    Gpu,
    Storage,
    Network,
    Other,
}

impl HardwareKind {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Mainboard => "mainboard",
            Self::SuperIo => "lpc",
            Self::Cpu => "cpu",
            Self::Memory => "ram",
            Self::Gpu => "gpu",
            Self::Storage => "storage",
            Self::Network => "nic",
            Self::Other => "hwmon",
        }
    }
}

impl fmt::Display for HardwareKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug)]
pub struct Hardware {
    identifier: Identifier,
    name: String,
    kind: HardwareKind,
    sensors: RwLock<Vec<Arc<Sensor>>>,
    sub_hardware: RwLock<Vec<Arc<Hardware>>>,
}

impl Hardware {
    pub fn new(name: impl Into<String>, kind: HardwareKind, identifier: Identifier) -> Arc<Self> {
        Arc::new(Self {
            identifier,
            name: name.into(),
            kind,
            sensors: RwLock::new(Vec::new()),
            sub_hardware: RwLock::new(Vec::new()),
        })
    }

    /// Hardware identified as `/<kind>/<device>`
    pub fn with_device(
        name: impl Into<String>,
        kind: HardwareKind,
        device: impl fmt::Display,
    ) -> Result<Arc<Self>> {
        let identifier = Identifier::parse(format!("/{}/{}", kind.slug(), device))?;
        Ok(Self::new(name, kind, identifier))
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> HardwareKind {
        self.kind
    }

    /// Mint a sensor owned by this hardware, identified as
    /// `<hardware identifier>/<sensor kind>/<index>`. The sensor is not attached.
    pub fn new_sensor(
        self: &Arc<Self>,
        name: impl Into<String>,
        kind: SensorKind,
        index: usize,
    ) -> Arc<Sensor> {
        let identifier = self.identifier.child(kind.slug()).child(index);
        Sensor::new(identifier, name, kind, Arc::downgrade(self))
    }

    /// Attach a sensor without publishing a change event
    pub fn push_sensor(&self, sensor: Arc<Sensor>) {
        self.sensors.write().push(sensor);
    }

    /// Attach sub-hardware without publishing a change event
    pub fn push_sub_hardware(&self, hardware: Arc<Hardware>) {
        self.sub_hardware.write().push(hardware);
    }

    pub(crate) fn take_sensor(&self, identifier: &Identifier) -> Option<Arc<Sensor>> {
        let mut sensors = self.sensors.write();
        let pos = sensors.iter().position(|s| s.identifier() == identifier)?;
        Some(sensors.remove(pos))
    }

    pub(crate) fn take_sub_hardware(&self, identifier: &Identifier) -> Option<Arc<Hardware>> {
        let mut children = self.sub_hardware.write();
        let pos = children.iter().position(|hw| hw.identifier() == identifier)?;
        Some(children.remove(pos))
    }

    /// Snapshot of the attached sensors in declared order
    pub fn sensors(&self) -> Vec<Arc<Sensor>> {
        self.sensors.read().clone()
    }

    /// Snapshot of the attached sub-hardware in declared order
    pub fn sub_hardware(&self) -> Vec<Arc<Hardware>> {
        self.sub_hardware.read().clone()
    }
}
