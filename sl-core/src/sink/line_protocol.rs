//! Line-protocol serialization of a sensor list
//!
//! ```text
//! motherboard,computer=<host>,sensor=name,device=<dev>,device_id=<host>_<dev> value=0
//! <hwkind>,computer=<host>,sensor=<kind>,device=<dev>,device_id=<host>_<dev>_<n>,sensor_number=<k>,openhw_id=<id> <field>=<value>
//! power,computer=<host> total=<sum>
//! ```
//!
//! Output is a pure function of its inputs. Every point ends with `\n`.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::constants::remote;
use crate::hw::{Sensor, SensorKind};

/// Tag-safe device name: space, `-` and `#` become `_`
pub fn sanitize_device_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '-' | '#' => '_',
            other => other,
        })
        .collect()
}

/// Field-safe sensor name: space and `-` become `_`, `#` becomes `0`
pub fn sanitize_field_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            ' ' | '-' => '_',
            '#' => '0',
            other => other,
        })
        .collect()
}

/// Shortest text that parses back to the same `f32`
pub fn format_value(value: f32) -> String {
    value.to_string()
}

/// Serialize `sensors` (already in traversal order) into one payload.
///
/// `host` must already be sanitized. The motherboard marker is omitted when
/// `mainboard` is `None`.
pub fn build_payload(host: &str, mainboard: Option<&str>, sensors: &[Arc<Sensor>]) -> String {
    let mut out = String::new();

    if let Some(board) = mainboard {
        let board = sanitize_device_name(board);
        let _ = writeln!(
            out,
            "{},computer={host},sensor=name,device={board},device_id={host}_{board} value=0",
            remote::MOTHERBOARD_MEASUREMENT
        );
    }

    let mut power_total = 0.0f32;
    for sensor in sensors {
        write_point(&mut out, host, sensor);
        if sensor.kind() == SensorKind::Power {
            power_total += sensor.value().unwrap_or(0.0);
        }
    }

    let _ = writeln!(
        out,
        "{},computer={host} total={}",
        remote::POWER_MEASUREMENT,
        format_value(power_total)
    );
    out
}

fn write_point(out: &mut String, host: &str, sensor: &Sensor) {
    let id = sensor.identifier();
    let device = sanitize_device_name(&sensor.hardware_name());
    let value = sensor.value().map(format_value).unwrap_or_else(|| "0".to_string());

    let _ = writeln!(
        out,
        "{measurement},computer={host},sensor={kind},device={device},device_id={host}_{device}_{number},sensor_number={index},openhw_id={openhw} {field}={value}",
        measurement = id.hardware_kind(),
        kind = id.sensor_kind(),
        number = id.device_number(),
        index = id.sensor_number(),
        openhw = id.underscored(),
        field = sanitize_field_name(sensor.name()),
    );
}
