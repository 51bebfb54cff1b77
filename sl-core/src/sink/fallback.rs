//! Local fallback file for payloads the remote store did not take

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::constants::remote;
use crate::error::{Result, SensorLogError};

#[derive(Debug, Clone)]
pub struct FallbackFile {
    path: PathBuf,
}

impl FallbackFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `payload` verbatim, terminated by exactly one newline
    pub fn append_payload(&self, payload: &str) -> Result<()> {
        self.append(&[payload])
    }

    /// Append an `Error=<detail>` line followed by the payload
    pub fn append_failure(&self, detail: &str, payload: &str) -> Result<()> {
        let line = format!("{}{}", remote::ERROR_LINE_PREFIX, detail.replace('\n', " "));
        self.append(&[&line, payload])
    }

    /// Same as the `append_*` calls, but a failure is only logged
    pub fn record(&self, detail: Option<&str>, payload: &str) {
        let result = match detail {
            Some(detail) => self.append_failure(detail, payload),
            None => self.append_payload(payload),
        };
        if let Err(e) = result {
            warn!(path = ?self.path, error = %e, "Could not write fallback file, payload dropped");
        }
    }

    fn append(&self, chunks: &[&str]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut text = String::new();
        for chunk in chunks {
            text.push_str(chunk.trim_end_matches('\n'));
            text.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| SensorLogError::FileWrite { path: self.path.clone(), source: e })?;
        file.write_all(text.as_bytes())
            .map_err(|e| SensorLogError::FileWrite { path: self.path.clone(), source: e })?;

        debug!(path = ?self.path, bytes = text.len(), "Appended to fallback file");
        Ok(())
    }
}
