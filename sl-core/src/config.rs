//! Remote sink configuration
//!
//! Stored as JSON next to the user's other configuration and re-read at the
//! start of every remote tick, so an operator can repoint the sink without a
//! restart:
//!
//! ```json
//! { "url": "localhost", "port": 8086, "db": "openhwmon", "username": "", "password": "" }
//! ```

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::remote;
use crate::error::{Result, SensorLogError};

/// Connection settings of the remote time-series store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSinkConfig {
    /// Host name, optionally with an `http://` or `https://` scheme
    pub url: String,
    pub port: u16,
    #[serde(rename = "db")]
    pub database: String,
    pub username: String,
    pub password: String,
}

impl Default for RemoteSinkConfig {
    fn default() -> Self {
        Self {
            url: remote::DEFAULT_HOST.to_string(),
            port: remote::DEFAULT_PORT,
            database: remote::DEFAULT_DATABASE.to_string(),
            username: String::new(),
            password: String::new(),
        }
    }
}

impl RemoteSinkConfig {
    /// Both credentials present
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }

    /// `<scheme>://<host>:<port>/write?db=<database>&source=<source>[&u=..&p=..]`
    pub fn endpoint_url(&self, source: &str) -> Result<Url> {
        let host = self.url.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(SensorLogError::InvalidConfig {
                field: "url".to_string(),
                reason: "empty host".to_string(),
            });
        }
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("http://{host}")
        };

        let mut url = Url::parse(&base).map_err(|e| SensorLogError::invalid_url(&base, e.to_string()))?;
        url.set_port(Some(self.port))
            .map_err(|()| SensorLogError::invalid_url(&base, "URL cannot carry a port"))?;
        url.set_path(remote::WRITE_PATH);
        {
            let mut query = url.query_pairs_mut();
            query.clear();
            query.append_pair("db", &self.database);
            query.append_pair("source", source);
            if self.has_credentials() {
                query.append_pair("u", &self.username);
                query.append_pair("p", &self.password);
            }
        }
        Ok(url)
    }

    /// Load the configuration for this tick.
    ///
    /// - missing file: defaults are written to `path` and returned
    /// - unparsable or unreadable file: defaults are returned, the file is left alone
    pub fn load_or_init(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Self>(&contents) {
                Ok(config) => {
                    debug!(path = ?path, host = %config.url, port = config.port, "Loaded remote sink config");
                    config
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "Remote sink config unparsable, using defaults for this tick");
                    Self::default()
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let config = Self::default();
                match config.save(path) {
                    Ok(()) => info!(path = ?path, "Wrote default remote sink config"),
                    Err(e) => warn!(path = ?path, error = %e, "Could not write default remote sink config"),
                }
                config
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Remote sink config unreadable, using defaults for this tick");
                Self::default()
            }
        }
    }

    /// Write the configuration atomically (temp file then rename)
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        let temp_path = temp_path_for(path);

        let mut file = fs::File::create(&temp_path)
            .map_err(|e| SensorLogError::FileWrite { path: temp_path.clone(), source: e })?;
        file.write_all(json.as_bytes())
            .map_err(|e| SensorLogError::FileWrite { path: temp_path.clone(), source: e })?;
        file.sync_all()
            .map_err(|e| SensorLogError::FileWrite { path: temp_path.clone(), source: e })?;
        drop(file);

        fs::rename(&temp_path, path)
            .map_err(|e| SensorLogError::FileWrite { path: path.to_path_buf(), source: e })?;
        Ok(())
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
