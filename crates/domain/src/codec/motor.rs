//! DC motor codec.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Spin direction for a single DC motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorDirection {
    Left,
    Right,
    #[default]
    Stop,
}

impl MotorDirection {
    /// Two-byte motor command: one byte per coil, full power or off.
    #[must_use]
    pub fn to_bytes(self) -> [u8; 2] {
        match self {
            Self::Left => [255, 0],
            Self::Right => [0, 255],
            Self::Stop => [0, 0],
        }
    }

    /// Parse a block menu value. Anything unrecognised stops the motor.
    #[must_use]
    pub fn from_menu(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl FromStr for MotorDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "stop" => Ok(Self::Stop),
            _ => Err(()),
        }
    }
}
