//! sensorlog core library
//!
//! Samples a hardware sensor tree on a fixed interval and writes each sample
//! either to a daily column log or to a remote line-protocol endpoint with a
//! local fallback file.
//!
//! - [`hw`]: hardware tree model and change notifications
//! - [`SensorTopology`]: slot-stable view of the live sensor set
//! - [`RateGate`]: interval check with a fixed jitter tolerance
//! - [`sink`]: column log, line-protocol push, fallback file
//! - [`LoggerCore`]: one tick = drain changes, gate, emit

pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod hw;
pub mod logger;
pub mod sink;
pub mod system;
pub mod topology;

pub use config::RemoteSinkConfig;
pub use error::{Result, SensorLogError};
pub use gate::RateGate;
pub use hw::{Hardware, HardwareKind, HardwareTree, Identifier, Sensor, SensorKind, TopologyEvent};
pub use logger::{LoggerCore, TickOutcome};
pub use sink::{ColumnLogSink, EmitOutcome, FallbackFile, RemoteLineSink, Sink};
pub use topology::{SensorTopology, TopologySnapshot};
