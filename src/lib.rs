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

//! sensorlog - hardware sensor logger for Linux
//!
//! The host side of the logger: a hwmon-backed hardware tree, sink selection
//! and the loop that ticks [`sl_core::LoggerCore`] on a fixed cadence.

pub mod app;
pub mod cli;
pub mod hwmon;
pub mod service;

#[cfg(test)]
pub mod test_utils;
