//! Daily column log
//!
//! One CSV file per local calendar day:
//!
//! ```text
//! ,<id_1>,<id_2>,...,<id_n>
//! Time,"<name_1>","<name_2>",...,"<name_n>"
//! <timestamp>,<value_1 or empty>,...,<value_n or empty>
//! ```
//!
//! Column order is fixed by the first header line. Reopening an existing file
//! for the same day adopts that order; live sensors without a column are not
//! logged until the next file.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDate};
use tracing::{debug, info, warn};

use super::EmitOutcome;
use crate::constants::column;
use crate::error::{Result, SensorLogError};
use crate::topology::{SensorTopology, TopologySnapshot};

/// File currently being appended to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFileHandle {
    pub path: PathBuf,
    pub day: NaiveDate,
    pub identifiers: Vec<String>,
}

#[derive(Debug)]
pub struct ColumnLogSink {
    dir: PathBuf,
    prefix: String,
    current: Option<LogFileHandle>,
}

impl ColumnLogSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_prefix(dir, column::DEFAULT_FILE_PREFIX)
    }

    pub fn with_prefix(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            current: None,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn current(&self) -> Option<&LogFileHandle> {
        self.current.as_ref()
    }

    /// `<dir>/<prefix>-<yyyy-MM-dd>.csv`
    pub fn file_path_for(&self, day: NaiveDate) -> PathBuf {
        self.dir.join(file_name_for(&self.prefix, day))
    }

    /// Append one row for `now`, opening or rotating the file first.
    ///
    /// I/O failures are logged and reported as [`EmitOutcome::WriteFailed`];
    /// they never propagate.
    pub fn write_tick(&mut self, topology: &SensorTopology, now: &DateTime<Local>) -> EmitOutcome {
        if let Err(e) = self.ensure_file(topology, now.date_naive()) {
            warn!(error = %e, "Column log unavailable for this tick");
            return EmitOutcome::WriteFailed;
        }
        let Some(handle) = self.current.as_ref() else {
            return EmitOutcome::WriteFailed;
        };
        let Some(snapshot) = topology.snapshot() else {
            warn!("Column log has no slot layout, row skipped");
            return EmitOutcome::WriteFailed;
        };

        let row = format_row(now, &snapshot);
        match append(&handle.path, &row) {
            Ok(()) => EmitOutcome::Written,
            Err(e) => {
                warn!(path = ?handle.path, error = %e, "Failed to append column log row");
                EmitOutcome::WriteFailed
            }
        }
    }

    fn ensure_file(&mut self, topology: &SensorTopology, today: NaiveDate) -> Result<()> {
        let path = self.file_path_for(today);
        if let Some(handle) = &self.current {
            if handle.day == today && handle.path.exists() {
                return Ok(());
            }
        }

        self.current = None;
        topology.reset();

        if path.exists() {
            match read_header(&path) {
                Ok(identifiers) => {
                    let snapshot = topology.adopt_identifiers(identifiers);
                    info!(path = ?path, columns = snapshot.len(), "Reattached to existing column log");
                    self.current = Some(LogFileHandle {
                        path,
                        day: today,
                        identifiers: snapshot.identifiers().to_vec(),
                    });
                    return Ok(());
                }
                Err(e) => warn!(path = ?path, error = %e, "Existing column log unusable, rebuilding"),
            }
        }

        let snapshot = topology.establish_from_tree();
        fs::create_dir_all(&self.dir)
            .map_err(|e| SensorLogError::FileWrite { path: self.dir.clone(), source: e })?;
        write_header(&path, &snapshot)?;
        info!(path = ?path, columns = snapshot.len(), "Created column log");

        self.current = Some(LogFileHandle {
            path,
            day: today,
            identifiers: snapshot.identifiers().to_vec(),
        });
        Ok(())
    }
}

pub fn file_name_for(prefix: &str, day: NaiveDate) -> String {
    format!(
        "{prefix}-{}.{}",
        day.format(column::FILE_DATE_FORMAT),
        column::FILE_EXTENSION
    )
}

pub fn format_timestamp(now: &DateTime<Local>) -> String {
    now.format(column::TIMESTAMP_FORMAT).to_string()
}

/// Both header lines, each newline-terminated
pub fn format_header(snapshot: &TopologySnapshot) -> String {
    let mut ids = String::new();
    let mut names = String::from(column::TIME_COLUMN);
    for (id, sensor) in snapshot.iter() {
        ids.push(',');
        ids.push_str(id);
        let name = sensor.map(|s| s.name()).unwrap_or(id);
        names.push_str(",\"");
        names.push_str(&name.replace('"', "\"\""));
        names.push('"');
    }
    format!("{ids}\n{names}\n")
}

/// `<timestamp>,<v1>,...,<vn>` with empty fields for absent values
pub fn format_row(now: &DateTime<Local>, snapshot: &TopologySnapshot) -> String {
    let mut row = format_timestamp(now);
    for value in snapshot.values() {
        row.push(',');
        if let Some(v) = value {
            row.push_str(&v.to_string());
        }
    }
    row.push('\n');
    row
}

/// Identifier ordering from a header's first line.
///
/// `None` when the line is empty or names no columns.
pub fn parse_header_line(line: &str) -> Option<Vec<String>> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return None;
    }
    let identifiers: Vec<String> = line.split(',').skip(1).map(str::to_string).collect();
    if identifiers.is_empty() {
        None
    } else {
        Some(identifiers)
    }
}

/// Read only the first line of `path` and parse it
pub fn read_header(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)
        .map_err(|e| SensorLogError::FileRead { path: path.to_path_buf(), source: e })?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .map_err(|e| SensorLogError::FileRead { path: path.to_path_buf(), source: e })?;
    parse_header_line(&line).ok_or_else(|| SensorLogError::header(path, "no column identifiers"))
}

/// Timestamp text and values of one data row
pub fn parse_row(line: &str) -> Option<(String, Vec<Option<f32>>)> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut fields = line.split(',');
    let timestamp = fields.next()?.to_string();
    let values = fields
        .map(|f| if f.is_empty() { Ok(None) } else { f.parse::<f32>().map(Some) })
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;
    Some((timestamp, values))
}

fn write_header(path: &Path, snapshot: &TopologySnapshot) -> Result<()> {
    let mut file = File::create(path)
        .map_err(|e| SensorLogError::FileWrite { path: path.to_path_buf(), source: e })?;
    file.write_all(format_header(snapshot).as_bytes())
        .map_err(|e| SensorLogError::FileWrite { path: path.to_path_buf(), source: e })
}

fn append(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|e| SensorLogError::FileWrite { path: path.to_path_buf(), source: e })?;
    file.write_all(text.as_bytes())
        .map_err(|e| SensorLogError::FileWrite { path: path.to_path_buf(), source: e })?;
    debug!(path = ?path, bytes = text.len(), "Appended column log row");
    Ok(())
}
