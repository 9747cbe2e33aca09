//! Virtual actuator: motor, lamp, matrix or buzzer.

use std::sync::{Mutex, PoisonError};

use blockbot_domain::device::GattEndpoint;

/// A simulated device with a single command characteristic.
pub struct VirtualActuator {
    command: GattEndpoint,
    value: Mutex<Vec<u8>>,
}

impl VirtualActuator {
    #[must_use]
    pub fn new(command: GattEndpoint) -> Self {
        Self {
            command,
            value: Mutex::new(Vec::new()),
        }
    }

    pub fn write(&self, endpoint: GattEndpoint, bytes: &[u8]) -> bool {
        if endpoint != self.command {
            return false;
        }
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = bytes.to_vec();
        true
    }

    /// The last written value; empty before the first write.
    #[must_use]
    pub fn read(&self, endpoint: GattEndpoint) -> Option<Vec<u8>> {
        (endpoint == self.command)
            .then(|| self.value.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }
}
