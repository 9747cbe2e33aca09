//! Sensor decoders and the cached telemetry snapshot.
//!
//! Decoders never fail: short or empty buffers decode to the zero value so
//! a bad read leaves the block accessor with a safe default.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// UTC timestamp of the last telemetry update.
pub type Timestamp = DateTime<Utc>;

/// Raw ambient light level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightReading {
    pub raw: u16,
}

impl LightReading {
    /// Decode `bytes[0] + bytes[1] * 255`.
    ///
    /// The high byte is weighted by 255, not 256; readings from the firmware
    /// are calibrated against that value.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        match bytes {
            [low, high, ..] => Self {
                raw: u16::from(*low) + u16::from(*high) * 255,
            },
            _ => Self::default(),
        }
    }
}

/// A single-byte boolean sensor (touch, proximity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoolReading(pub bool);

impl BoolReading {
    /// `true` only when the first byte is exactly `1`.
    #[must_use]
    pub fn decode(bytes: &[u8]) -> Self {
        Self(bytes.first() == Some(&1))
    }
}

/// Which sensor characteristic a poll read targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Probe {
    Light,
    Touch,
    Proximity,
}

/// Last known value of every sensor a device exposes.
///
/// Fields a device does not have stay at their zero value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub light: LightReading,
    pub touched: BoolReading,
    pub near: BoolReading,
    /// When a probe last updated the snapshot; `None` until the first read.
    pub updated_at: Option<Timestamp>,
}

impl SensorSnapshot {
    /// Fold a raw probe reading into the snapshot.
    pub fn apply(&mut self, probe: Probe, bytes: &[u8], at: Timestamp) {
        match probe {
            Probe::Light => self.light = LightReading::decode(bytes),
            Probe::Touch => self.touched = BoolReading::decode(bytes),
            Probe::Proximity => self.near = BoolReading::decode(bytes),
        }
        self.updated_at = Some(at);
    }
}
