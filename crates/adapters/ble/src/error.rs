//! BLE adapter error types.

use blockbot_app::error::TransportError;
use blockbot_domain::device::GattEndpoint;
use blockbot_domain::payload::PeripheralId;

/// Errors specific to the BLE adapter.
#[derive(Debug, thiserror::Error)]
pub enum BleError {
    /// No BLE adapter found on the host.
    #[error("no BLE adapter available")]
    NotAvailable,

    /// A btleplug operation failed.
    #[error("BLE stack error")]
    Stack(#[from] btleplug::Error),

    /// The peripheral id was not seen by the last scan.
    #[error("unknown peripheral {0}")]
    UnknownPeripheral(PeripheralId),

    /// Nothing is connected.
    #[error("no peripheral connected")]
    NotConnected,

    /// Connecting and discovering services took too long.
    #[error("connection timed out")]
    ConnectTimeout,

    /// The connected peripheral lacks the characteristic.
    #[error("characteristic {0} not found")]
    CharacteristicNotFound(GattEndpoint),
}

impl BleError {
    /// Convert into a [`TransportError`] for propagation across the port
    /// boundary.
    #[must_use]
    pub fn into_transport(self) -> TransportError {
        match self {
            Self::NotAvailable => TransportError::Unavailable,
            Self::UnknownPeripheral(id) => TransportError::NotFound(id),
            Self::NotConnected => TransportError::NotConnected,
            Self::CharacteristicNotFound(endpoint) => {
                TransportError::MissingCharacteristic(endpoint)
            }
            other => TransportError::Backend(Box::new(other)),
        }
    }
}

impl From<BleError> for TransportError {
    fn from(err: BleError) -> Self {
        err.into_transport()
    }
}
