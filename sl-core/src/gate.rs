//! Tick rate limiting
//!
//! The host may call `tick` more often than the logging interval. A tick
//! proceeds once `now >= last_success + interval - tolerance`; the tolerance
//! keeps a tick that lands a few milliseconds early from being skipped for a
//! whole interval.

use std::time::Duration;

use chrono::{DateTime, TimeZone};

use crate::constants::timing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateGate {
    tolerance: Duration,
}

impl Default for RateGate {
    fn default() -> Self {
        Self::new(timing::GATE_TOLERANCE)
    }
}

impl RateGate {
    pub fn new(tolerance: Duration) -> Self {
        Self { tolerance }
    }

    /// Whether a tick at `now` may proceed. Pure: a negative answer changes nothing.
    pub fn should_proceed<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_success: Option<&DateTime<Tz>>,
        interval: Duration,
    ) -> bool {
        let Some(last) = last_success else {
            return true;
        };
        // A negative elapsed time (clock stepped back) never proceeds
        match now.clone().signed_duration_since(last.clone()).to_std() {
            Ok(elapsed) => elapsed >= interval.saturating_sub(self.tolerance),
            Err(_) => false,
        }
    }
}
