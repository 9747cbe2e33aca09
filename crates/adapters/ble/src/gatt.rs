//! GATT helpers for a connected block peripheral.

use std::time::Duration;

use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;

use blockbot_app::ports::WriteMode;
use blockbot_domain::device::GattEndpoint;

use crate::error::BleError;

/// Connect and discover services, bounded by `timeout`.
///
/// A peripheral that connects but fails service discovery is disconnected
/// again before returning.
///
/// # Errors
///
/// Returns [`BleError::ConnectTimeout`] or the underlying stack error.
pub(crate) async fn connect(peripheral: &Peripheral, timeout: Duration) -> Result<(), BleError> {
    let attempt = async {
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        peripheral.discover_services().await
    };

    let result = match tokio::time::timeout(timeout, attempt).await {
        Ok(result) => result.map_err(BleError::from),
        Err(_) => Err(BleError::ConnectTimeout),
    };

    if result.is_err() {
        if let Err(err) = peripheral.disconnect().await {
            tracing::debug!(%err, "cleanup disconnect failed");
        }
    }
    result
}

/// Find a characteristic by service and characteristic UUID on a
/// peripheral that has already discovered its services.
///
/// # Errors
///
/// Returns [`BleError::CharacteristicNotFound`] if the pair is absent.
pub(crate) fn find_characteristic(
    peripheral: &Peripheral,
    endpoint: GattEndpoint,
) -> Result<Characteristic, BleError> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == endpoint.characteristic && c.service_uuid == endpoint.service)
        .ok_or(BleError::CharacteristicNotFound(endpoint))
}

pub(crate) fn write_type(mode: WriteMode) -> WriteType {
    match mode {
        WriteMode::WithResponse => WriteType::WithResponse,
        WriteMode::WithoutResponse => WriteType::WithoutResponse,
    }
}
