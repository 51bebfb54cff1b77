//! Sensor nodes of the hardware tree

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::hardware::Hardware;
use super::identifier::Identifier;

/// What a sensor measures. The slug is the sensor-kind segment of identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    Voltage,
    Current,
    Clock,
    Temperature,
    Load,
    Fan,
    Flow,
    Control,
    Level,
    Factor,
    Power,
    Energy,
    Data,
    SmallData,
    Throughput,
}

impl SensorKind {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Clock => "clock",
            Self::Temperature => "temperature",
            Self::Load => "load",
            Self::Fan => "fan",
            Self::Flow => "flow",
            Self::Control => "control",
            Self::Level => "level",
            Self::Factor => "factor",
            Self::Power => "power",
            Self::Energy => "energy",
            Self::Data => "data",
            Self::SmallData => "smalldata",
            Self::Throughput => "throughput",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// A single measurement point owned by a [`Hardware`] node.
///
/// The value is written by whatever layer polls the hardware and read by the
/// sinks, so it sits behind its own lock.
#[derive(Debug)]
pub struct Sensor {
    identifier: Identifier,
    name: String,
    kind: SensorKind,
    hardware: Weak<Hardware>,
    value: RwLock<Option<f32>>,
}

impl Sensor {
    pub(crate) fn new(
        identifier: Identifier,
        name: impl Into<String>,
        kind: SensorKind,
        hardware: Weak<Hardware>,
    ) -> Arc<Self> {
        Arc::new(Self {
            identifier,
            name: name.into(),
            kind,
            hardware,
            value: RwLock::new(None),
        })
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> SensorKind {
        self.kind
    }

    /// Owning hardware, if it is still alive
    pub fn hardware(&self) -> Option<Arc<Hardware>> {
        self.hardware.upgrade()
    }

    /// Name of the owning hardware, empty once the hardware is dropped
    pub fn hardware_name(&self) -> String {
        self.hardware()
            .map(|hw| hw.name().to_string())
            .unwrap_or_default()
    }

    /// Current reading, `None` until first measured
    pub fn value(&self) -> Option<f32> {
        *self.value.read()
    }

    pub fn set_value(&self, value: Option<f32>) {
        *self.value.write() = value;
    }
}
