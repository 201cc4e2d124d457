//! Hostname detection

use std::env;
use tracing::warn;

/// Resolve the `hostname` sent with every entry.
///
/// Tries, in order: `DD_HOSTNAME`, `HOSTNAME`, the system hostname, and
/// finally `"unknown"`. Empty values are skipped.
#[must_use]
pub fn get_hostname() -> String {
    for var in ["DD_HOSTNAME", "HOSTNAME"] {
        if let Ok(hostname) = env::var(var) {
            if !hostname.is_empty() {
                return hostname;
            }
        }
    }

    if let Some(hostname) = system_hostname() {
        return hostname;
    }

    warn!("Could not determine hostname, using 'unknown'");
    "unknown".to_string()
}

#[cfg(unix)]
fn system_hostname() -> Option<String> {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_str().filter(|s| !s.is_empty()).map(str::to_string),
        Err(e) => {
            warn!("Failed to get system hostname: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn system_hostname() -> Option<String> {
    env::var("COMPUTERNAME").ok().filter(|s| !s.is_empty())
}
