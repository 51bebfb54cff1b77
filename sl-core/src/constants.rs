//! Constants and configuration values for sensorlog
//!
//! Centralizes magic numbers, paths, and configuration defaults.
//! Add new values here first instead of scattering literals through the sinks.

use std::time::Duration;

/// System paths
pub mod paths {
    use std::path::PathBuf;

    /// Base path for hwmon devices
    pub const HWMON_BASE: &str = "/sys/class/hwmon";

    /// Directory name used under the user config / data directories
    pub const APP_DIR: &str = "sensorlog";

    /// Remote sink configuration document
    pub const REMOTE_CONFIG_FILE: &str = "remote.json";

    /// Fallback file for payloads the remote store did not accept
    pub const FALLBACK_FILE: &str = "fallback.log";

    /// User configuration directory.
    ///
    /// `XDG_CONFIG_HOME` and `HOME` are honoured before the platform default so
    /// a service started with a custom environment finds the operator's file.
    pub fn user_config_dir() -> Option<PathBuf> {
        let config_base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else if let Ok(home) = std::env::var("HOME") {
            Some(PathBuf::from(home).join(".config"))
        } else {
            dirs::config_dir()
        };

        config_base.map(|p| p.join(APP_DIR))
    }

    /// Directory holding the daily column logs and the fallback file
    pub fn default_log_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join(APP_DIR))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Default location of the remote sink configuration
    pub fn default_remote_config_path() -> PathBuf {
        user_config_dir()
            .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR))
            .join(REMOTE_CONFIG_FILE)
    }

    /// DMI paths for mainboard identification
    pub mod dmi {
        pub const BOARD_NAME: &str = "/sys/devices/virtual/dmi/id/board_name";
    }

    /// Host identity sources, tried in order
    pub mod host {
        pub const PROC_HOSTNAME: &str = "/proc/sys/kernel/hostname";
        pub const ETC_HOSTNAME: &str = "/etc/hostname";
    }
}

/// Timing constants for the tick scheduler
pub mod timing {
    use super::*;

    /// Margin absorbing scheduler jitter so a slightly early tick still proceeds
    pub const GATE_TOLERANCE: Duration = Duration::from_millis(500);

    /// Logging interval used when the host does not configure one
    pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(1);

    /// Host cadence between tick invocations
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
}

/// Column log file format
pub mod column {
    /// File name prefix, full name is `<prefix>-<yyyy-MM-dd>.csv`
    pub const DEFAULT_FILE_PREFIX: &str = "sensorlog";

    /// File extension for daily logs
    pub const FILE_EXTENSION: &str = "csv";

    /// Date part of the daily file name
    pub const FILE_DATE_FORMAT: &str = "%Y-%m-%d";

    /// Invariant general date/time format (`MM/dd/yyyy HH:mm:ss`)
    pub const TIMESTAMP_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

    /// First field of the second header line
    pub const TIME_COLUMN: &str = "Time";
}

/// Remote line-protocol sink
pub mod remote {
    use super::*;

    pub const DEFAULT_HOST: &str = "localhost";
    pub const DEFAULT_PORT: u16 = 8086;
    pub const DEFAULT_DATABASE: &str = "openhwmon";

    /// Path of the write endpoint on the remote store
    pub const WRITE_PATH: &str = "/write";

    /// Upper bound for one POST, including connect
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    /// Prefix of the diagnostic line written before a failed payload
    pub const ERROR_LINE_PREFIX: &str = "Error=";

    /// Measurement of the per-tick mainboard marker point
    pub const MOTHERBOARD_MEASUREMENT: &str = "motherboard";

    /// Measurement of the closing power total point
    pub const POWER_MEASUREMENT: &str = "power";
}

/// Topology change notification queue
pub mod events {
    /// Capacity of each subscriber's bounded event queue
    pub const QUEUE_CAPACITY: usize = 256;
}
