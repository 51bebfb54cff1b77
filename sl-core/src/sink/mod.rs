//! Sink strategies
//!
//! Exactly one sink is active for the life of a [`LoggerCore`](crate::LoggerCore);
//! it is chosen at startup and never switched.

mod column;
mod fallback;
pub mod line_protocol;
mod remote;

pub use column::{
    file_name_for, format_header, format_row, format_timestamp, parse_header_line, parse_row,
    read_header, ColumnLogSink, LogFileHandle,
};
pub use fallback::FallbackFile;
pub use remote::RemoteLineSink;

use chrono::{DateTime, Local};

use crate::topology::SensorTopology;

/// What one emit did. Informational only: the tick completes either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitOutcome {
    /// Row appended to the column log
    Written,
    /// Column log could not be opened or appended
    WriteFailed,
    /// Remote store answered 2xx
    Delivered,
    /// Remote store answered 4xx; payload went to the fallback file
    Rejected,
    /// Network error, timeout or unexpected status; diagnostic and payload went to the fallback file
    TransportFailed,
}

impl EmitOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, Self::Written | Self::Delivered)
    }
}

pub enum Sink {
    Column(ColumnLogSink),
    Remote(RemoteLineSink),
}

impl Sink {
    pub async fn emit(&mut self, topology: &SensorTopology, now: &DateTime<Local>) -> EmitOutcome {
        match self {
            Self::Column(sink) => sink.write_tick(topology, now),
            Self::Remote(sink) => sink.send(topology).await,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Column(_) => "column",
            Self::Remote(_) => "remote",
        }
    }
}

impl From<ColumnLogSink> for Sink {
    fn from(sink: ColumnLogSink) -> Self {
        Self::Column(sink)
    }
}

impl From<RemoteLineSink> for Sink {
    fn from(sink: RemoteLineSink) -> Self {
        Self::Remote(sink)
    }
}
