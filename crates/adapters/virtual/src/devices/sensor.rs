//! Virtual sensor: light/touch or proximity, values set from outside.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use blockbot_domain::device::{GattEndpoint, LIGHT};

/// A simulated read-only device.
pub struct VirtualSensor {
    values: Mutex<HashMap<GattEndpoint, Vec<u8>>>,
}

impl VirtualSensor {
    /// Every endpoint starts at its zero reading.
    #[must_use]
    pub fn new(endpoints: &[GattEndpoint]) -> Self {
        let values = endpoints
            .iter()
            .map(|endpoint| (*endpoint, zero_value(*endpoint)))
            .collect();
        Self {
            values: Mutex::new(values),
        }
    }

    /// Program the raw bytes returned for `endpoint`.
    ///
    /// Returns `false` when the sensor has no such endpoint.
    pub fn set(&self, endpoint: GattEndpoint, bytes: &[u8]) -> bool {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        match values.get_mut(&endpoint) {
            Some(value) => {
                *value = bytes.to_vec();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn read(&self, endpoint: GattEndpoint) -> Option<Vec<u8>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&endpoint)
            .cloned()
    }
}

fn zero_value(endpoint: GattEndpoint) -> Vec<u8> {
    if endpoint == LIGHT { vec![0, 0] } else { vec![0] }
}
