/*
 * Test utilities for sensorlog
 *
 * A throwaway sysfs tree shaped like /sys/class/hwmon so the producer and
 * the service loop can run without real hardware.
 */

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub struct FakeSysfs {
    dir: TempDir,
}

impl FakeSysfs {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("hwmon")).unwrap();
        Self { dir }
    }

    /// The `class/hwmon` directory
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("hwmon")
    }

    /// Scratch space next to the fake sysfs
    pub fn scratch(&self) -> &Path {
        self.dir.path()
    }

    /// Create (or extend) `hwmonN` with a `name` file and the given attribute files
    pub fn chip(&self, tag: &str, name: &str, files: &[(&str, &str)]) {
        let chip = self.root().join(tag);
        fs::create_dir_all(&chip).unwrap();
        fs::write(chip.join("name"), format!("{name}\n")).unwrap();
        for (file, contents) in files {
            fs::write(chip.join(file), format!("{contents}\n")).unwrap();
        }
    }

    pub fn set(&self, tag: &str, file: &str, contents: &str) {
        fs::write(self.root().join(tag).join(file), format!("{contents}\n")).unwrap();
    }

    pub fn remove(&self, tag: &str) {
        fs::remove_dir_all(self.root().join(tag)).unwrap();
    }
}
