//! Device kinds, their GATT identifiers and advertised identities.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::sensor::Probe;

/// A `{service, characteristic}` pair on a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GattEndpoint {
    pub service: Uuid,
    pub characteristic: Uuid,
}

impl GattEndpoint {
    const fn from_u128(service: u128, characteristic: u128) -> Self {
        Self {
            service: Uuid::from_u128(service),
            characteristic: Uuid::from_u128(characteristic),
        }
    }
}

impl fmt::Display for GattEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.characteristic)
    }
}

pub const DC_MOTOR_A: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0100_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0101_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const DC_MOTOR_B: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0200_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0201_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const RGB_LAMP: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0300_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0301_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const DOT_MATRIX: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0400_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0401_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const BUZZER: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0500_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0501_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const LIGHT: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0600_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0601_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const TOUCH: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0610_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0611_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);
pub const PROXIMITY: GattEndpoint = GattEndpoint::from_u128(
    0x4b1e_0700_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
    0x4b1e_0701_9c1e_4f3b_a5d2_5b0a_7e3c_2f10,
);

/// How a group key qualifies the advertised name during discovery.
///
/// Device kinds disagree on this, so it is fixed per kind rather than
/// configured globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPolicy {
    /// Match `"<name>-<group>"` exactly.
    ExactSuffix,
    /// Match any name starting with `"<name>-<group>"`.
    PrefixSuffix,
    /// Ignore the group key and match the plain name.
    Ignore,
}

/// Every peripheral kind the block extensions drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    DcMotorA,
    DcMotorB,
    RgbLamp,
    DotMatrix,
    Buzzer,
    LightTouch,
    Proximity,
}

/// Fixed-interval sensor reads a device needs once connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryPlan {
    pub interval: Duration,
    pub probes: Vec<(GattEndpoint, Probe)>,
}

/// Advertised identity and GATT layout of a device kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub advertised_name: &'static str,
    pub group_policy: GroupPolicy,
    /// Characteristic that receives commands, if the device takes any.
    pub command: Option<GattEndpoint>,
    /// Every endpoint the channel touches, commands and sensors alike.
    pub endpoints: Vec<GattEndpoint>,
}

impl DeviceKind {
    pub const ALL: [Self; 7] = [
        Self::DcMotorA,
        Self::DcMotorB,
        Self::RgbLamp,
        Self::DotMatrix,
        Self::Buzzer,
        Self::LightTouch,
        Self::Proximity,
    ];

    #[must_use]
    pub fn identity(self) -> DeviceIdentity {
        let (advertised_name, group_policy, command, endpoints) = match self {
            Self::DcMotorA => (
                "DC Motor",
                GroupPolicy::ExactSuffix,
                Some(DC_MOTOR_A),
                vec![DC_MOTOR_A],
            ),
            Self::DcMotorB => (
                "DC Motor",
                GroupPolicy::PrefixSuffix,
                Some(DC_MOTOR_B),
                vec![DC_MOTOR_B],
            ),
            Self::RgbLamp => (
                "MASTER",
                GroupPolicy::ExactSuffix,
                Some(RGB_LAMP),
                vec![RGB_LAMP],
            ),
            Self::DotMatrix => (
                "DOT MATRIX",
                GroupPolicy::ExactSuffix,
                Some(DOT_MATRIX),
                vec![DOT_MATRIX],
            ),
            Self::Buzzer => (
                "BUZZER",
                GroupPolicy::PrefixSuffix,
                Some(BUZZER),
                vec![BUZZER],
            ),
            Self::LightTouch => (
                "LIGHT TOUCH",
                GroupPolicy::ExactSuffix,
                None,
                vec![LIGHT, TOUCH],
            ),
            Self::Proximity => ("PROXIMITY", GroupPolicy::Ignore, None, vec![PROXIMITY]),
        };
        DeviceIdentity {
            advertised_name,
            group_policy,
            command,
            endpoints,
        }
    }

    /// Sensor polling to start after connecting; `None` for actuators.
    #[must_use]
    pub fn telemetry(self) -> Option<TelemetryPlan> {
        match self {
            Self::LightTouch => Some(TelemetryPlan {
                interval: Duration::from_millis(500),
                probes: vec![(LIGHT, Probe::Light), (TOUCH, Probe::Touch)],
            }),
            Self::Proximity => Some(TelemetryPlan {
                interval: Duration::from_millis(200),
                probes: vec![(PROXIMITY, Probe::Proximity)],
            }),
            _ => None,
        }
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::DcMotorA => "dc_motor_a",
            Self::DcMotorB => "dc_motor_b",
            Self::RgbLamp => "rgb_lamp",
            Self::DotMatrix => "dot_matrix",
            Self::Buzzer => "buzzer",
            Self::LightTouch => "light_touch",
            Self::Proximity => "proximity",
        })
    }
}
