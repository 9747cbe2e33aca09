//! Daemon settings: which device to drive, over which radio, and how loudly
//! to log.
//!
//! Read from an optional `blockbot.toml` in the working directory, then
//! overridden by `BLOCKBOT_*` environment variables.

use serde::Deserialize;

use blockbot_adapter_ble::BleConfig;
use blockbot_domain::device::DeviceKind;
use blockbot_domain::filter::GroupKey;

pub const DEVICE_VAR: &str = "BLOCKBOT_DEVICE";
pub const GROUP_VAR: &str = "BLOCKBOT_GROUP";
pub const TRANSPORT_VAR: &str = "BLOCKBOT_TRANSPORT";
pub const LOG_VAR: &str = "BLOCKBOT_LOG";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Which peripheral to drive.
    pub device: DeviceConfig,
    /// Radio backend settings.
    pub transport: TransportConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Target peripheral.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub kind: DeviceKind,
    /// Classroom group appended to the advertised name.
    pub group: Option<String>,
}

/// Which transport adapter to wire in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    #[default]
    Ble,
    Virtual,
}

/// Transport configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub backend: Backend,
    #[serde(flatten)]
    pub ble: BleConfig,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `blockbot.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// result fails validation.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("blockbot.toml")?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(val) = lookup(DEVICE_VAR) {
            self.device.kind = parse_kind(&val)?;
        }
        if let Some(val) = lookup(GROUP_VAR) {
            self.device.group = Some(val);
        }
        if let Some(val) = lookup(TRANSPORT_VAR) {
            self.transport.backend = match val.trim() {
                "ble" => Backend::Ble,
                "virtual" => Backend::Virtual,
                other => {
                    return Err(ConfigError::Validation(format!(
                        "unknown transport backend {other:?}"
                    )));
                }
            };
        }
        if let Some(val) = lookup(LOG_VAR) {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.transport.ble.scan_duration_secs == 0 {
            return Err(ConfigError::Validation(
                "scan duration must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured group key; blank groups count as none.
    #[must_use]
    pub fn group_key(&self) -> Option<GroupKey> {
        self.device.group.as_deref().and_then(GroupKey::new)
    }
}

fn parse_kind(value: &str) -> Result<DeviceKind, ConfigError> {
    let value = value.trim();
    DeviceKind::ALL
        .into_iter()
        .find(|kind| kind.to_string() == value)
        .ok_or_else(|| ConfigError::Validation(format!("unknown device kind {value:?}")))
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            kind: DeviceKind::RgbLamp,
            group: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "blockbotd=info,blockbot=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
