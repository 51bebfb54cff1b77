/*
 * This file is part of sensorlog.
 *
 * Copyright (C) 2025 sensorlog contributors
 *
 * sensorlog is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * sensorlog is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with sensorlog. If not, see <https://www.gnu.org/licenses/>.
 */

//! Host scheduling loop
//!
//! Every cadence step rescans hwmon (publishing hardware changes and updating
//! values) and then offers a tick to the logger; the logger's rate gate decides
//! whether anything is written. At most one tick is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use sl_core::{LoggerCore, TickOutcome};

use crate::hwmon::HwmonProducer;

/// Set by the signal handler, polled once per cadence step
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Set [`SHUTDOWN`] on SIGINT, SIGTERM or SIGHUP
pub fn install_shutdown_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);
    })
}

/// Maximum consecutive rescan errors before escalating the log level
const MAX_CONSECUTIVE_ERRORS: u32 = 10;

/// Counters for one service run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServiceStats {
    pub steps: u64,
    pub emitted: u64,
    pub skipped: u64,
}

/// One cadence step: rescan, then tick
pub async fn step(producer: &mut HwmonProducer, logger: &mut LoggerCore) -> TickOutcome {
    match producer.update() {
        Ok(report) if !report.is_empty() => {
            info!(added = ?report.added, removed = ?report.removed, "Hardware changed");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "hwmon rescan failed, logging last known tree"),
    }
    logger.tick(Local::now()).await
}

/// Run until `shutdown` is set or `max_steps` steps have run
pub async fn run(
    producer: &mut HwmonProducer,
    logger: &mut LoggerCore,
    poll: Duration,
    shutdown: &AtomicBool,
    max_steps: Option<u64>,
) -> ServiceStats {
    info!(
        poll_ms = poll.as_millis() as u64,
        interval_ms = logger.interval().as_millis() as u64,
        sink = logger.sink().kind(),
        "Logging loop starting"
    );

    let mut ticker = time::interval(poll);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut stats = ServiceStats::default();
    let mut consecutive_failures: u32 = 0;

    loop {
        ticker.tick().await;
        if shutdown.load(Ordering::SeqCst) {
            info!("Logging loop shutting down");
            break;
        }

        match step(producer, logger).await {
            TickOutcome::Skipped => stats.skipped += 1,
            TickOutcome::Emitted(outcome) => {
                stats.emitted += 1;
                if outcome.is_success() {
                    if consecutive_failures > 0 {
                        debug!(failures = consecutive_failures, "Sink recovered");
                    }
                    consecutive_failures = 0;
                } else {
                    consecutive_failures += 1;
                    if consecutive_failures % MAX_CONSECUTIVE_ERRORS == 0 {
                        error!(failures = consecutive_failures, ?outcome, "Sink keeps failing");
                    }
                }
            }
        }
        stats.steps += 1;

        if max_steps.is_some_and(|max| stats.steps >= max) {
            break;
        }
    }

    info!(steps = stats.steps, emitted = stats.emitted, skipped = stats.skipped, "Logging loop stopped");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSysfs;
    use sl_core::{ColumnLogSink, EmitOutcome, SensorTopology};
    use std::sync::Arc;

    fn logger_for(producer: &HwmonProducer, dir: &std::path::Path, interval: Duration) -> LoggerCore {
        let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
        LoggerCore::new(topology, ColumnLogSink::new(dir)).with_interval(interval)
    }

    #[tokio::test]
    async fn test_step_emits_then_gates() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "41000")]);
        let mut producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();
        let mut logger = logger_for(&producer, &sysfs.scratch().join("logs"), Duration::from_secs(3600));

        assert_eq!(step(&mut producer, &mut logger).await, TickOutcome::Emitted(EmitOutcome::Written));
        assert_eq!(step(&mut producer, &mut logger).await, TickOutcome::Skipped);
    }

    #[cfg(unix)]
    #[test]
    fn test_sigterm_sets_shutdown_flag() {
        install_shutdown_handler().unwrap();

        let status = std::process::Command::new("sh")
            .arg("-c")
            .arg(format!("kill -TERM {}", std::process::id()))
            .status()
            .unwrap();
        assert!(status.success());

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while !SHUTDOWN.load(Ordering::SeqCst) && std::time::Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(SHUTDOWN.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown_flag() {
        let sysfs = FakeSysfs::new();
        let mut producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();
        let mut logger = logger_for(&producer, &sysfs.scratch().join("logs"), Duration::from_secs(1));

        let shutdown = AtomicBool::new(true);
        let stats = run(&mut producer, &mut logger, Duration::from_millis(10), &shutdown, None).await;
        assert_eq!(stats.steps, 0);
    }

    #[tokio::test]
    async fn test_run_bounded_steps() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "41000")]);
        let mut producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();
        let mut logger = logger_for(&producer, &sysfs.scratch().join("logs"), Duration::from_secs(3600));

        let shutdown = AtomicBool::new(false);
        let stats = run(&mut producer, &mut logger, Duration::from_millis(5), &shutdown, Some(3)).await;
        assert_eq!(stats, ServiceStats { steps: 3, emitted: 1, skipped: 2 });
    }
}
