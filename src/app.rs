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

//! Startup wiring: producer, sink and logger from the command line options

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::info;

use sl_core::constants::paths::dmi;
use sl_core::{ColumnLogSink, LoggerCore, RemoteLineSink, SensorTopology, Sink};

use crate::cli::{LogOptions, SinkChoice};
use crate::hwmon::{self, HwmonProducer};

pub fn build_producer(options: &LogOptions) -> anyhow::Result<HwmonProducer> {
    let board = options
        .board_name
        .clone()
        .unwrap_or_else(|| hwmon::read_board_name(Path::new(dmi::BOARD_NAME)));
    HwmonProducer::new(&options.hwmon_root, &board)
        .with_context(|| format!("Failed to scan {}", options.hwmon_root.display()))
}

pub fn build_sink(options: &LogOptions) -> anyhow::Result<Sink> {
    let sink = match options.sink {
        SinkChoice::Column => {
            let dir = options.log_dir();
            info!(dir = ?dir, prefix = %options.prefix, "Column log sink selected");
            Sink::from(ColumnLogSink::with_prefix(dir, options.prefix.clone()))
        }
        SinkChoice::Remote => {
            let config = options.remote_config_path();
            let fallback = options.fallback_path();
            let mut sink = RemoteLineSink::with_timeout(&config, &fallback, options.timeout())
                .context("Failed to create remote sink")?;
            if let Some(name) = &options.computer_name {
                sink = sink.with_computer_name(name);
            }
            info!(
                config = ?config,
                fallback = ?fallback,
                computer = sink.computer_name(),
                "Remote line-protocol sink selected"
            );
            Sink::from(sink)
        }
    };
    Ok(sink)
}

pub fn build_logger(options: &LogOptions, producer: &HwmonProducer, sink: Sink) -> LoggerCore {
    let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
    LoggerCore::new(topology, sink).with_interval(options.interval())
}

/// One row of `sensorlog list`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorEntry {
    pub slot: usize,
    pub identifier: String,
    pub hardware: String,
    pub name: String,
    pub kind: &'static str,
    pub value: Option<f32>,
}

/// Every sensor of the tree in slot order
pub fn list_sensors(topology: &SensorTopology) -> Vec<SensorEntry> {
    let snapshot = topology.refresh();
    snapshot
        .slots()
        .iter()
        .enumerate()
        .filter_map(|(slot, sensor)| {
            let sensor = sensor.as_ref()?;
            Some(SensorEntry {
                slot,
                identifier: sensor.identifier().to_string(),
                hardware: sensor.hardware_name(),
                name: sensor.name().to_string(),
                kind: sensor.kind().slug(),
                value: sensor.value(),
            })
        })
        .collect()
}

pub fn render_table(entries: &[SensorEntry]) -> String {
    let id_width = entries
        .iter()
        .map(|e| e.identifier.len())
        .max()
        .unwrap_or(0)
        .max("IDENTIFIER".len());

    let mut out = format!("{:>4}  {:<id_width$}  {:>10}  NAME\n", "SLOT", "IDENTIFIER", "VALUE");
    for entry in entries {
        let value = entry
            .value
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:>4}  {:<id_width$}  {:>10}  {} / {}\n",
            entry.slot, entry.identifier, value, entry.hardware, entry.name
        ));
    }
    out
}
