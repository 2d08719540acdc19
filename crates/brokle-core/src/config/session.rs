//! Client session configuration.

use serde::{Deserialize, Serialize};

/// Settings for the client session store and the refresh coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Directory for the file-backed session storage.
    #[serde(default = "default_storage_dir")]
    pub storage_dir: String,
    /// Renew this many seconds before the access token expires.
    #[serde(default = "default_refresh_margin")]
    pub refresh_margin_seconds: u64,
    /// Upper bound between renewals, in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_seconds: u64,
    /// Buffer size of the cross-instance session bus.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,
    /// How often to look for session events written by other processes
    /// sharing `storage_dir`, in milliseconds.
    #[serde(default = "default_signal_poll")]
    pub signal_poll_millis: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            refresh_margin_seconds: default_refresh_margin(),
            refresh_interval_seconds: default_refresh_interval(),
            bus_capacity: default_bus_capacity(),
            signal_poll_millis: default_signal_poll(),
        }
    }
}

fn default_storage_dir() -> String {
    "data/session".to_string()
}

fn default_refresh_margin() -> u64 {
    60
}

fn default_refresh_interval() -> u64 {
    14 * 60
}

fn default_bus_capacity() -> usize {
    16
}

fn default_signal_poll() -> u64 {
    1000
}
