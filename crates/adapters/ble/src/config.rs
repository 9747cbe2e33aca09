//! BLE transport configuration.

use std::time::Duration;

use serde::Deserialize;

/// Configuration for the btleplug transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BleConfig {
    /// How long a `scan` listens for advertisements, in seconds.
    pub scan_duration_secs: u16,
    /// Upper bound on connecting and discovering services, in seconds.
    pub connect_timeout_secs: u16,
}

impl BleConfig {
    #[must_use]
    pub fn scan_duration(&self) -> Duration {
        Duration::from_secs(u64::from(self.scan_duration_secs))
    }

    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.connect_timeout_secs))
    }
}

impl Default for BleConfig {
    fn default() -> Self {
        Self {
            scan_duration_secs: 5,
            connect_timeout_secs: 10,
        }
    }
}
