//! Error types, re-exported from the shared `sl-error` crate

pub use sl_error::{Result, SensorLogError};
