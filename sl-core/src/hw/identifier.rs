//! Hierarchical sensor identifiers
//!
//! Identifiers look like `/cpu/0/temperature/2`: hardware kind, device number,
//! sensor kind, sensor number. Some hardware uses a non-numeric device segment
//! (`/lpc/nct6798d/fan/1`), in which case the device number reads as 0 and the
//! second segment stands in for the sensor kind.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SensorLogError};

/// Identifier of a sensor or hardware node
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Parse an identifier, which must start with `/`
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if !raw.starts_with('/') || raw.len() < 2 {
            return Err(SensorLogError::InvalidIdentifier(raw));
        }
        Ok(Self(raw))
    }

    /// Append a child segment
    pub fn child(&self, segment: impl fmt::Display) -> Self {
        Self(format!("{}/{}", self.0, segment))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path segments without the leading empty one
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').skip(1)
    }

    fn segment(&self, n: usize) -> Option<&str> {
        self.segments().nth(n)
    }

    /// First segment: `cpu` in `/cpu/0/temperature/2`
    pub fn hardware_kind(&self) -> &str {
        self.segment(0).unwrap_or_default()
    }

    /// Second segment when numeric, otherwise 0
    pub fn device_number(&self) -> i32 {
        self.segment(1).and_then(|s| s.parse().ok()).unwrap_or(0)
    }

    /// `temperature` in `/cpu/0/temperature/2`, `nct6798d` in `/lpc/nct6798d/fan/1`
    pub fn sensor_kind(&self) -> &str {
        let numeric_device = self.segment(1).is_some_and(|s| s.parse::<i32>().is_ok());
        let idx = if numeric_device { 2 } else { 1 };
        self.segment(idx).unwrap_or_default()
    }

    /// Trailing segment when numeric, otherwise 0
    pub fn sensor_number(&self) -> i32 {
        self.0
            .rsplit('/')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Path separators replaced by underscores: `_cpu_0_temperature_2`
    pub fn underscored(&self) -> String {
        self.0.replace('/', "_")
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Identifier {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<String> for Identifier {
    fn eq(&self, other: &String) -> bool {
        &self.0 == other
    }
}
