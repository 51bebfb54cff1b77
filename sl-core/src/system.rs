//! Host identity
//!
//! The remote store keys every point by the machine name, so it is read once
//! and sanitized for use in line-protocol tags.

use std::fs;

use tracing::debug;

use crate::constants::paths;

/// Read system hostname
pub fn read_hostname() -> String {
    for source in [paths::host::PROC_HOSTNAME, paths::host::ETC_HOSTNAME] {
        if let Ok(hostname) = fs::read_to_string(source) {
            let h = hostname.trim();
            if !h.is_empty() {
                return h.to_string();
            }
        }
    }

    if let Ok(hostname) = std::env::var("HOSTNAME") {
        let h = hostname.trim();
        if !h.is_empty() {
            return h.to_string();
        }
    }

    debug!("No hostname source available, using localhost");
    "localhost".to_string()
}

/// Machine name as it appears in the `computer` tag
pub fn computer_name() -> String {
    sanitize_computer_name(&read_hostname())
}

/// Spaces and hyphens are not valid in the store's tag values
pub fn sanitize_computer_name(raw: &str) -> String {
    raw.replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_computer_name() {
        assert_eq!(sanitize_computer_name("build-box 01"), "build_box_01");
        assert_eq!(sanitize_computer_name("plain"), "plain");
    }

    #[test]
    fn test_hostname_never_empty() {
        assert!(!read_hostname().is_empty());
    }
}
