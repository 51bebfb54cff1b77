//! Hardware tree model
//!
//! Hardware nodes own sensors and sub-hardware; [`HardwareTree`] owns the roots
//! and publishes attach/detach changes to subscribers.

mod hardware;
mod identifier;
mod sensor;
mod tree;

pub use hardware::{Hardware, HardwareKind};
pub use identifier::Identifier;
pub use sensor::{Sensor, SensorKind};
pub use tree::{visit_sensors, HardwareTree, TopologyEvent, TopologySubscription};
