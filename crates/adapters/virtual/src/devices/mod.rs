//! Virtual peripherals: one simulated GATT device per block kind.
//!
//! Actuators remember the last value written to their command
//! characteristic and return it on read. Sensors return whatever value the
//! test or demo last programmed.

mod actuator;
mod sensor;

pub use actuator::VirtualActuator;
pub use sensor::VirtualSensor;

use blockbot_domain::device::{DeviceKind, GattEndpoint};
use blockbot_domain::payload::PeripheralId;

/// Wrapper enum for the concrete virtual device types.
pub enum VirtualDevice {
    Actuator(VirtualActuator),
    Sensor(VirtualSensor),
}

impl VirtualDevice {
    /// Build the simulated device for `kind`.
    #[must_use]
    pub fn for_kind(kind: DeviceKind) -> Self {
        let identity = kind.identity();
        match identity.command {
            Some(command) => Self::Actuator(VirtualActuator::new(command)),
            None => Self::Sensor(VirtualSensor::new(&identity.endpoints)),
        }
    }

    /// Store a written value.
    ///
    /// Returns `false` when the device has no such writable endpoint.
    pub fn write(&self, endpoint: GattEndpoint, bytes: &[u8]) -> bool {
        match self {
            Self::Actuator(d) => d.write(endpoint, bytes),
            Self::Sensor(_) => false,
        }
    }

    /// Current value of an endpoint, or `None` if the device lacks it.
    #[must_use]
    pub fn read(&self, endpoint: GattEndpoint) -> Option<Vec<u8>> {
        match self {
            Self::Actuator(d) => d.read(endpoint),
            Self::Sensor(d) => d.read(endpoint),
        }
    }
}

/// A simulated peripheral as seen over the air.
pub struct VirtualPeripheral {
    pub id: PeripheralId,
    pub local_name: String,
    pub rssi: i16,
    pub kind: DeviceKind,
    pub device: VirtualDevice,
}
