//! Tick orchestration
//!
//! `Idle -> RateCheck -> {Skip | Emit} -> Idle`. An emit always advances the
//! last-success time to the tick's timestamp, whatever the sink reported.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, trace};

use crate::constants::timing;
use crate::gate::RateGate;
use crate::sink::{EmitOutcome, Sink};
use crate::topology::SensorTopology;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Too early for the configured interval; nothing changed
    Skipped,
    Emitted(EmitOutcome),
}

pub struct LoggerCore {
    topology: Arc<SensorTopology>,
    gate: RateGate,
    sink: Sink,
    interval: Duration,
    last_success: Option<DateTime<Local>>,
}

impl LoggerCore {
    pub fn new(topology: Arc<SensorTopology>, sink: impl Into<Sink>) -> Self {
        Self {
            topology,
            gate: RateGate::default(),
            sink: sink.into(),
            interval: timing::DEFAULT_LOG_INTERVAL,
            last_success: None,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Takes effect from the next tick
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn last_success(&self) -> Option<DateTime<Local>> {
        self.last_success
    }

    pub fn topology(&self) -> &Arc<SensorTopology> {
        &self.topology
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Run one tick at `now`.
    ///
    /// Queued hardware changes are applied first so a removal seen before the
    /// tick shows up as empty fields in this tick's output.
    pub async fn tick(&mut self, now: DateTime<Local>) -> TickOutcome {
        let applied = self.topology.apply_pending();
        if applied > 0 {
            trace!(events = applied, "Applied topology changes");
        }

        if !self
            .gate
            .should_proceed(&now, self.last_success.as_ref(), self.interval)
        {
            return TickOutcome::Skipped;
        }

        let outcome = self.sink.emit(&self.topology, &now).await;
        self.last_success = Some(now);
        debug!(sink = self.sink.kind(), ?outcome, "Tick emitted");
        TickOutcome::Emitted(outcome)
    }
}
