//! End-to-end tests: fake hwmon tree -> producer -> logger -> daily column log

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Local, TimeZone};
use clap::Parser;
use serial_test::serial;
use tempfile::TempDir;

use sensorlog::cli::{Cli, SinkChoice};
use sensorlog::hwmon::HwmonProducer;
use sl_core::sink::{file_name_for, parse_header_line, parse_row};
use sl_core::{ColumnLogSink, EmitOutcome, LoggerCore, SensorTopology, TickOutcome};

struct Sysfs {
    dir: TempDir,
}

impl Sysfs {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("hwmon")).unwrap();
        Self { dir }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("hwmon")
    }

    fn logs(&self) -> PathBuf {
        self.dir.path().join("logs")
    }

    fn chip(&self, tag: &str, name: &str, files: &[(&str, &str)]) {
        let chip = self.root().join(tag);
        fs::create_dir_all(&chip).unwrap();
        fs::write(chip.join("name"), format!("{name}\n")).unwrap();
        for (file, contents) in files {
            fs::write(chip.join(file), format!("{contents}\n")).unwrap();
        }
    }

    fn remove(&self, tag: &str) {
        fs::remove_dir_all(self.root().join(tag)).unwrap();
    }
}

fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).single().unwrap()
}

fn read_log(dir: &Path, at: &DateTime<Local>) -> (Vec<String>, Vec<Vec<Option<f32>>>) {
    let text = fs::read_to_string(dir.join(file_name_for("sensorlog", at.date_naive()))).unwrap();
    let mut lines = text.lines();
    let ids = parse_header_line(lines.next().unwrap()).unwrap();
    let _names = lines.next().unwrap();
    let rows = lines.map(|l| parse_row(l).unwrap().1).collect();
    (ids, rows)
}

fn column_of(ids: &[String], id: &str) -> usize {
    ids.iter().position(|i| i == id).unwrap()
}

#[tokio::test]
async fn test_rows_follow_hot_remove_and_return() {
    let sysfs = Sysfs::new();
    sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "40000"), ("temp1_label", "Tctl")]);
    sysfs.chip("hwmon1", "amdgpu", &[("temp1_input", "55000"), ("temp1_label", "edge")]);

    let mut producer = HwmonProducer::new(sysfs.root(), "Test Board").unwrap();
    let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
    let mut logger = LoggerCore::new(topology, ColumnLogSink::new(sysfs.logs()))
        .with_interval(std::time::Duration::from_secs(1));

    let t0 = morning();
    assert_eq!(logger.tick(t0).await, TickOutcome::Emitted(EmitOutcome::Written));

    sysfs.remove("hwmon1");
    producer.update().unwrap();
    let t1 = t0 + ChronoDuration::seconds(2);
    assert_eq!(logger.tick(t1).await, TickOutcome::Emitted(EmitOutcome::Written));

    sysfs.chip("hwmon1", "amdgpu", &[("temp1_input", "57000"), ("temp1_label", "edge")]);
    producer.update().unwrap();
    let t2 = t1 + ChronoDuration::seconds(2);
    assert_eq!(logger.tick(t2).await, TickOutcome::Emitted(EmitOutcome::Written));

    let (ids, rows) = read_log(&sysfs.logs(), &t0);
    assert_eq!(ids.len(), 2);
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|r| r.len() == ids.len()));

    let cpu = column_of(&ids, "/cpu/0/temperature/0");
    let gpu = column_of(&ids, "/gpu/0/temperature/0");
    assert_eq!(rows[0][cpu], Some(40.0));
    assert_eq!(rows[0][gpu], Some(55.0));
    assert_eq!(rows[1][cpu], Some(40.0));
    assert_eq!(rows[1][gpu], None);
    assert_eq!(rows[2][gpu], Some(57.0));
}

#[tokio::test]
async fn test_new_chip_waits_for_next_file() {
    let sysfs = Sysfs::new();
    sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "40000")]);

    let mut producer = HwmonProducer::new(sysfs.root(), "Test Board").unwrap();
    let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
    let mut logger = LoggerCore::new(topology, ColumnLogSink::new(sysfs.logs()))
        .with_interval(std::time::Duration::from_secs(1));

    let t0 = morning();
    logger.tick(t0).await;

    sysfs.chip("hwmon1", "nvme", &[("temp1_input", "33850")]);
    producer.update().unwrap();
    logger.tick(t0 + ChronoDuration::seconds(1)).await;

    let (ids, rows) = read_log(&sysfs.logs(), &t0);
    assert_eq!(ids, vec!["/cpu/0/temperature/0".to_string()]);
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.len() == 1));

    // The next day's file is laid out from the whole tree
    let tomorrow = t0 + ChronoDuration::days(1);
    logger.tick(tomorrow).await;
    let (ids, rows) = read_log(&sysfs.logs(), &tomorrow);
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&"/storage/0/temperature/0".to_string()));
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn test_restart_reattaches_to_existing_file() {
    let sysfs = Sysfs::new();
    sysfs.chip("hwmon0", "k10temp", &[("temp1_input", "40000")]);
    sysfs.chip("hwmon1", "amdgpu", &[("temp1_input", "55000")]);
    let t0 = morning();

    {
        let producer = HwmonProducer::new(sysfs.root(), "Test Board").unwrap();
        let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
        let mut logger = LoggerCore::new(topology, ColumnLogSink::new(sysfs.logs()));
        logger.tick(t0).await;
    }

    // Second process start with the cpu chip gone
    sysfs.remove("hwmon0");
    let producer = HwmonProducer::new(sysfs.root(), "Test Board").unwrap();
    let topology = Arc::new(SensorTopology::new(producer.tree().clone()));
    let mut logger = LoggerCore::new(topology, ColumnLogSink::new(sysfs.logs()));
    logger.tick(t0 + ChronoDuration::minutes(5)).await;

    let (ids, rows) = read_log(&sysfs.logs(), &t0);
    assert_eq!(ids.len(), 2);
    assert_eq!(rows.len(), 2);
    let cpu = column_of(&ids, "/cpu/0/temperature/0");
    let gpu = column_of(&ids, "/gpu/0/temperature/0");
    assert_eq!(rows[1][cpu], None);
    assert_eq!(rows[1][gpu], Some(55.0));
}

#[test]
#[serial]
fn test_environment_supplies_options() {
    std::env::set_var("SENSORLOG_SINK", "remote");
    std::env::set_var("SENSORLOG_INTERVAL", "30");
    let cli = Cli::try_parse_from(["sensorlog", "--interval", "5"]).unwrap();
    std::env::remove_var("SENSORLOG_SINK");
    std::env::remove_var("SENSORLOG_INTERVAL");

    assert_eq!(cli.options.sink, SinkChoice::Remote);
    assert_eq!(cli.options.interval(), std::time::Duration::from_secs(5));
}

#[test]
#[serial]
fn test_remote_config_defaults_under_xdg_config_home() {
    let home = TempDir::new().unwrap();
    let previous = std::env::var_os("XDG_CONFIG_HOME");
    std::env::set_var("XDG_CONFIG_HOME", home.path());

    let cli = Cli::try_parse_from(["sensorlog"]).unwrap();
    let path = cli.options.remote_config_path();

    match previous {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    assert_eq!(path, home.path().join("sensorlog").join("remote.json"));
}
