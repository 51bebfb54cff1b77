//! Command Line Interface

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use sl_core::constants::{column, paths, remote, timing};

#[derive(Parser, Debug)]
#[command(name = "sensorlog")]
#[command(version)]
#[command(about = "sensorlog - hardware sensor logger for Linux")]
#[command(long_about = "sensorlog - hardware sensor logger for Linux

Samples every hwmon sensor on a fixed interval and writes the samples either
to a daily CSV column log or to a line-protocol endpoint, keeping anything
the endpoint did not accept in a local fallback file.

EXAMPLES:
    sensorlog                              Log to daily CSV files (default)
    sensorlog run --sink remote            Push to the configured endpoint
    sensorlog once --log-dir /tmp/logs     Write a single row and exit
    sensorlog list --json                  Show every sensor in slot order

ENVIRONMENT VARIABLES:
    SENSORLOG_LOG=debug    Log level (trace, debug, info, warn, error)

FILES:
    ~/.config/sensorlog/remote.json        Remote endpoint (url, port, db, username, password)
    ~/.local/share/sensorlog/              Daily logs and fallback.log")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(flatten)]
    pub options: LogOptions,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Log until interrupted (default)
    Run,
    /// Emit a single tick and exit
    Once,
    /// Print every sensor in slot order
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkChoice {
    /// Daily CSV column log
    Column,
    /// Line-protocol POST with local fallback
    Remote,
}

#[derive(Args, Debug, Clone)]
pub struct LogOptions {
    /// Sink receiving the samples
    #[arg(long, global = true, value_enum, env = "SENSORLOG_SINK", default_value = "column")]
    pub sink: SinkChoice,

    /// Logging interval in seconds
    #[arg(long, global = true, env = "SENSORLOG_INTERVAL", default_value_t = timing::DEFAULT_LOG_INTERVAL.as_secs())]
    pub interval: u64,

    /// Directory for daily logs and the fallback file
    #[arg(long, global = true, env = "SENSORLOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Daily log file name prefix
    #[arg(long, global = true, env = "SENSORLOG_PREFIX", default_value = column::DEFAULT_FILE_PREFIX)]
    pub prefix: String,

    /// Remote sink configuration file
    #[arg(long, global = true, env = "SENSORLOG_REMOTE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Fallback file for payloads the endpoint did not accept
    #[arg(long, global = true, env = "SENSORLOG_FALLBACK")]
    pub fallback: Option<PathBuf>,

    /// hwmon class directory
    #[arg(long, global = true, env = "SENSORLOG_HWMON_ROOT", default_value = paths::HWMON_BASE)]
    pub hwmon_root: PathBuf,

    /// Mainboard name, read from DMI when omitted
    #[arg(long, global = true, env = "SENSORLOG_BOARD_NAME")]
    pub board_name: Option<String>,

    /// Host name used in remote tags, read from the system when omitted
    #[arg(long, global = true, env = "SENSORLOG_COMPUTER_NAME")]
    pub computer_name: Option<String>,

    /// Milliseconds between ticks offered to the logger
    #[arg(long, global = true, env = "SENSORLOG_POLL_MS", default_value_t = timing::DEFAULT_POLL_INTERVAL.as_millis() as u64)]
    pub poll_ms: u64,

    /// Remote request timeout in seconds
    #[arg(long, global = true, env = "SENSORLOG_TIMEOUT", default_value_t = remote::REQUEST_TIMEOUT.as_secs())]
    pub timeout_secs: u64,
}

impl LogOptions {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    pub fn poll(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log_dir.clone().unwrap_or_else(paths::default_log_dir)
    }

    pub fn remote_config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(paths::default_remote_config_path)
    }

    pub fn fallback_path(&self) -> PathBuf {
        self.fallback
            .clone()
            .unwrap_or_else(|| self.log_dir().join(paths::FALLBACK_FILE))
    }
}
