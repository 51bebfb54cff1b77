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

//! Linux hwmon hardware producer
//!
//! Builds the hardware tree from `/sys/class/hwmon`: a mainboard root named
//! from DMI, SuperIO chips nested under it, every other chip as its own root.
//! Chips are tracked by their resolved sysfs directory; a rescan publishes
//! chips that appeared or vanished through [`HardwareTree`].

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, trace};

use sl_core::{Hardware, HardwareKind, HardwareTree, Sensor, SensorKind};

#[derive(Error, Debug)]
pub enum HwmonError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Hardware model error: {0}")]
    Model(#[from] sl_error::SensorLogError),
}

/// One family of `<prefix><N><suffix>` input files
struct InputFamily {
    prefix: &'static str,
    suffixes: &'static [&'static str],
    kind: SensorKind,
    /// sysfs unit per logged unit
    divisor: f64,
    fallback_label: &'static str,
}

const FAMILIES: &[InputFamily] = &[
    InputFamily { prefix: "temp", suffixes: &["_input"], kind: SensorKind::Temperature, divisor: 1000.0, fallback_label: "Temperature" },
    InputFamily { prefix: "fan", suffixes: &["_input"], kind: SensorKind::Fan, divisor: 1.0, fallback_label: "Fan" },
    InputFamily { prefix: "in", suffixes: &["_input"], kind: SensorKind::Voltage, divisor: 1000.0, fallback_label: "Voltage" },
    InputFamily { prefix: "curr", suffixes: &["_input"], kind: SensorKind::Current, divisor: 1000.0, fallback_label: "Current" },
    InputFamily { prefix: "power", suffixes: &["_input", "_average"], kind: SensorKind::Power, divisor: 1_000_000.0, fallback_label: "Power" },
    InputFamily { prefix: "freq", suffixes: &["_input"], kind: SensorKind::Clock, divisor: 1_000_000.0, fallback_label: "Clock" },
];

struct ChipInput {
    path: PathBuf,
    divisor: f64,
    sensor: Arc<Sensor>,
}

struct TrackedChip {
    hardware: Arc<Hardware>,
    nested: bool,
    inputs: Vec<ChipInput>,
}

/// Chips added and removed by one rescan
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl ScanReport {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub struct HwmonProducer {
    root: PathBuf,
    tree: Arc<HardwareTree>,
    mainboard: Arc<Hardware>,
    chips: BTreeMap<PathBuf, TrackedChip>,
}

impl HwmonProducer {
    /// Scan `root` once and read every value
    pub fn new(root: impl Into<PathBuf>, board_name: &str) -> Result<Self, HwmonError> {
        let mainboard = Hardware::with_device(board_name, HardwareKind::Mainboard, 0)?;
        let tree = Arc::new(HardwareTree::with_roots(vec![mainboard.clone()]));
        let mut producer = Self {
            root: root.into(),
            tree,
            mainboard,
            chips: BTreeMap::new(),
        };
        let report = producer.rescan()?;
        producer.refresh_values();
        info!(
            root = ?producer.root,
            board = board_name,
            chips = report.added.len(),
            sensors = producer.tree.sensors().len(),
            "Hardware tree built from hwmon"
        );
        Ok(producer)
    }

    pub fn tree(&self) -> &Arc<HardwareTree> {
        &self.tree
    }

    pub fn chip_count(&self) -> usize {
        self.chips.len()
    }

    /// Rescan and refresh values; the per-cadence step of the service loop
    pub fn update(&mut self) -> Result<ScanReport, HwmonError> {
        let report = self.rescan()?;
        self.refresh_values();
        Ok(report)
    }

    /// Diff chip directories against the tracked set and publish the changes
    pub fn rescan(&mut self) -> Result<ScanReport, HwmonError> {
        let found = discover_chips(&self.root)?;
        let found_dirs: HashSet<&PathBuf> = found.iter().map(|(dir, _)| dir).collect();
        let mut report = ScanReport::default();

        let gone: Vec<PathBuf> = self
            .chips
            .keys()
            .filter(|dir| !found_dirs.contains(dir))
            .cloned()
            .collect();
        for dir in gone {
            let Some(chip) = self.chips.remove(&dir) else { continue };
            let id = chip.hardware.identifier().clone();
            if chip.nested {
                self.tree.remove_sub_hardware(&self.mainboard, &id);
            } else {
                self.tree.remove_hardware(&id);
            }
            info!(chip = %id, dir = ?dir, "hwmon chip removed");
            report.removed.push(id.to_string());
        }

        for (dir, name) in &found {
            if self.chips.contains_key(dir) {
                continue;
            }
            let chip = self.build_chip(dir, name)?;
            let hardware = chip.hardware.clone();
            if chip.nested {
                self.tree.add_sub_hardware(&self.mainboard, hardware.clone());
            } else {
                self.tree.add_hardware(hardware.clone());
            }
            debug!(chip = %hardware.identifier(), name = %hardware.name(), inputs = chip.inputs.len(), "hwmon chip added");
            report.added.push(hardware.identifier().to_string());
            self.chips.insert(dir.clone(), chip);
        }

        Ok(report)
    }

    /// Read every tracked input; unreadable inputs become unmeasured
    pub fn refresh_values(&self) -> usize {
        let mut failures = 0;
        for chip in self.chips.values() {
            for input in &chip.inputs {
                let value = read_trimmed(&input.path)
                    .ok()
                    .and_then(|raw| raw.parse::<f64>().ok())
                    .map(|raw| (raw / input.divisor) as f32);
                if value.is_none() {
                    failures += 1;
                    trace!(path = ?input.path, "hwmon input unreadable");
                }
                input.sensor.set_value(value);
            }
        }
        failures
    }

    fn build_chip(&self, dir: &Path, chip_name: &str) -> Result<TrackedChip, HwmonError> {
        let kind = classify_chip(chip_name);
        let device = self.next_device_number(kind);
        let display = read_trimmed(dir.join("device").join("model"))
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| chip_name.to_string());
        let hardware = Hardware::with_device(display, kind, device)?;

        let mut inputs = Vec::new();
        let files = list_files(dir);
        for family in FAMILIES {
            for (position, (number, path)) in family_inputs(&files, dir, family).into_iter().enumerate() {
                let label = read_trimmed(dir.join(format!("{}{}_label", family.prefix, number)))
                    .ok()
                    .filter(|l| !l.is_empty())
                    .unwrap_or_else(|| format!("{} #{}", family.fallback_label, number));
                let sensor = hardware.new_sensor(label, family.kind, position);
                hardware.push_sensor(sensor.clone());
                inputs.push(ChipInput { path, divisor: family.divisor, sensor });
            }
        }

        Ok(TrackedChip {
            hardware,
            nested: kind == HardwareKind::SuperIo,
            inputs,
        })
    }

    /// Smallest device number of `kind` not held by a tracked chip
    fn next_device_number(&self, kind: HardwareKind) -> i32 {
        let used: HashSet<i32> = self
            .chips
            .values()
            .filter(|c| c.hardware.kind() == kind)
            .map(|c| c.hardware.identifier().device_number())
            .collect();
        (0..).find(|n| !used.contains(n)).unwrap_or(0)
    }
}

/// Board name from DMI, `Mainboard` when unavailable
pub fn read_board_name(path: &Path) -> String {
    read_trimmed(path)
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Mainboard".to_string())
}

/// Hardware kind from the hwmon driver name
pub fn classify_chip(name: &str) -> HardwareKind {
    const SUPERIO: &[&str] = &["nct6", "nct7", "it87", "it86", "w83", "f71", "f75", "f81", "sch5", "asus"];
    const CPU: &[&str] = &["coretemp", "k10temp", "k8temp", "zenpower", "via_cputemp", "fam15h_power"];
    const GPU: &[&str] = &["amdgpu", "radeon", "nouveau", "i915"];
    const STORAGE: &[&str] = &["nvme", "drivetemp"];
    const MEMORY: &[&str] = &["jc42", "spd5118", "ee1004"];
    const NETWORK: &[&str] = &["r8169", "iwlwifi", "mt79", "ath1", "igc", "e1000e"];

    let name = name.to_ascii_lowercase();
    let matches = |list: &[&str]| list.iter().any(|p| name.starts_with(p));
    if matches(SUPERIO) {
        HardwareKind::SuperIo
    } else if matches(CPU) {
        HardwareKind::Cpu
    } else if name == "xe" || matches(GPU) {
        HardwareKind::Gpu
    } else if matches(STORAGE) {
        HardwareKind::Storage
    } else if matches(MEMORY) {
        HardwareKind::Memory
    } else if matches(NETWORK) {
        HardwareKind::Network
    } else {
        HardwareKind::Other
    }
}

/// `(resolved chip dir, driver name)` for every hwmon entry, in `hwmonN` order
fn discover_chips(root: &Path) -> Result<Vec<(PathBuf, String)>, HwmonError> {
    let entries = match fs::read_dir(root) {
        Ok(it) => it,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut chips: Vec<(usize, PathBuf, String)> = Vec::new();
    for ent in entries.flatten() {
        let path = ent.path();
        if !path.is_dir() {
            continue;
        }
        let dir = fs::canonicalize(&path).unwrap_or(path);
        let tag = ent.file_name().to_string_lossy().into_owned();
        let order = extract_index(&tag, "hwmon", "").unwrap_or(usize::MAX);
        let name = read_trimmed(dir.join("name")).unwrap_or_else(|_| "unknown".into());
        chips.push((order, dir, name));
    }

    chips.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(chips.into_iter().map(|(_, dir, name)| (dir, name)).collect())
}

fn list_files(dir: &Path) -> Vec<String> {
    let Ok(iter) = fs::read_dir(dir) else {
        return Vec::new();
    };
    iter.flatten()
        .map(|f| f.file_name().to_string_lossy().into_owned())
        .collect()
}

/// Input files of one family by channel number; the first listed suffix wins
fn family_inputs(files: &[String], dir: &Path, family: &InputFamily) -> Vec<(usize, PathBuf)> {
    let mut by_number: BTreeMap<usize, PathBuf> = BTreeMap::new();
    for suffix in family.suffixes {
        for fname in files {
            if let Some(number) = extract_index(fname, family.prefix, suffix) {
                by_number.entry(number).or_insert_with(|| dir.join(fname));
            }
        }
    }
    by_number.into_iter().collect()
}

fn read_trimmed<P: AsRef<Path>>(p: P) -> io::Result<String> {
    let mut s = String::new();
    fs::File::open(p)?.read_to_string(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn extract_index(fname: &str, prefix: &str, suffix: &str) -> Option<usize> {
    if fname.len() > prefix.len() + suffix.len() && fname.starts_with(prefix) && fname.ends_with(suffix) {
        let mid = &fname[prefix.len()..fname.len() - suffix.len()];
        mid.parse().ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeSysfs;

    #[test]
    fn test_extract_index() {
        assert_eq!(extract_index("temp12_input", "temp", "_input"), Some(12));
        assert_eq!(extract_index("in0_input", "in", "_input"), Some(0));
        assert_eq!(extract_index("intrusion0_alarm", "in", "_input"), None);
        assert_eq!(extract_index("temp_input", "temp", "_input"), None);
        assert_eq!(extract_index("hwmon3", "hwmon", ""), Some(3));
    }

    #[test]
    fn test_classify_chip() {
        assert_eq!(classify_chip("nct6798"), HardwareKind::SuperIo);
        assert_eq!(classify_chip("it8688"), HardwareKind::SuperIo);
        assert_eq!(classify_chip("k10temp"), HardwareKind::Cpu);
        assert_eq!(classify_chip("amdgpu"), HardwareKind::Gpu);
        assert_eq!(classify_chip("nvme"), HardwareKind::Storage);
        assert_eq!(classify_chip("spd5118"), HardwareKind::Memory);
        assert_eq!(classify_chip("r8169_0_800:00"), HardwareKind::Network);
        assert_eq!(classify_chip("acpitz"), HardwareKind::Other);
    }

    #[test]
    fn test_tree_layout_and_units() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "45250"), ("temp1_label", "Tctl")]);
        sysfs.chip(
            "hwmon1",
            "nct6798",
            &[("fan1_input", "1034"), ("fan2_input", "0"), ("in0_input", "1200")],
        );
        sysfs.chip("hwmon2", "amdgpu", &[("power1_average", "182500000"), ("freq1_input", "2100000000")]);

        let producer = HwmonProducer::new(sysfs.root(), "PRIME X570-PRO").unwrap();
        let ids: Vec<(String, String, Option<f32>)> = producer
            .tree()
            .sensors()
            .iter()
            .map(|s| (s.identifier().to_string(), s.name().to_string(), s.value()))
            .collect();

        assert_eq!(
            ids,
            vec![
                ("/lpc/0/fan/0".to_string(), "Fan #1".to_string(), Some(1034.0)),
                ("/lpc/0/fan/1".to_string(), "Fan #2".to_string(), Some(0.0)),
                ("/lpc/0/voltage/0".to_string(), "Voltage #0".to_string(), Some(1.2)),
                ("/cpu/0/temperature/0".to_string(), "Tctl".to_string(), Some(45.25)),
                ("/gpu/0/power/0".to_string(), "Power #1".to_string(), Some(182.5)),
                ("/gpu/0/clock/0".to_string(), "Clock #1".to_string(), Some(2100.0)),
            ]
        );
        assert_eq!(producer.tree().mainboard().unwrap().name(), "PRIME X570-PRO");
    }

    #[test]
    fn test_rescan_publishes_changes() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "40000")]);
        let mut producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();
        let mut events = producer.tree().subscribe();

        sysfs.chip("hwmon1", "nvme", &[("temp1_input", "38000")]);
        let report = producer.update().unwrap();
        assert_eq!(report.added, vec!["/storage/0".to_string()]);
        assert!(events.try_next().is_some());

        sysfs.remove("hwmon0");
        let report = producer.update().unwrap();
        assert_eq!(report.removed, vec!["/cpu/0".to_string()]);
        assert_eq!(producer.chip_count(), 1);
        assert!(events.try_next().is_some());

        assert!(producer.update().unwrap().is_empty());
    }

    #[test]
    fn test_device_numbers_are_reused() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "nvme", &[("temp1_input", "30000")]);
        sysfs.chip("hwmon1", "nvme", &[("temp1_input", "31000")]);
        let mut producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();

        sysfs.remove("hwmon0");
        producer.update().unwrap();
        sysfs.chip("hwmon2", "nvme", &[("temp1_input", "32000")]);
        let report = producer.update().unwrap();

        assert_eq!(report.added, vec!["/storage/0".to_string()]);
    }

    #[test]
    fn test_unreadable_value_is_unmeasured() {
        let sysfs = FakeSysfs::new();
        sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "garbage")]);
        let producer = HwmonProducer::new(sysfs.root(), "Board").unwrap();

        assert_eq!(producer.refresh_values(), 1);
        assert_eq!(producer.tree().sensors()[0].value(), None);

        sysfs.set("hwmon0", "temp1_input", "52000");
        assert_eq!(producer.refresh_values(), 0);
        assert_eq!(producer.tree().sensors()[0].value(), Some(52.0));
    }

    #[test]
    fn test_missing_root_yields_bare_mainboard() {
        let producer = HwmonProducer::new("/nonexistent/hwmon", "Board").unwrap();
        assert_eq!(producer.chip_count(), 0);
        assert!(producer.tree().sensors().is_empty());
    }
}
