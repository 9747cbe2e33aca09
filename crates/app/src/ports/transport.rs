//! Transport port: a BLE session to a single peripheral.
//!
//! A transport is created fresh for every scan and owned by one
//! [`PeripheralChannel`](crate::channel::PeripheralChannel). Payloads cross
//! this boundary in their base64 form.

use std::future::Future;

use blockbot_domain::device::GattEndpoint;
use blockbot_domain::filter::DiscoveryFilter;
use blockbot_domain::payload::{DiscoveredPeripheral, Payload, PeripheralId};

use crate::error::TransportError;

/// Whether a write waits for the peripheral's acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    WithResponse,
    WithoutResponse,
}

/// A generic BLE session.
///
/// Implementations live in adapter crates (`adapter_ble`, `adapter_virtual`).
pub trait Transport: Send + Sync + 'static {
    /// Discover peripherals matching `filter`.
    fn scan(
        &self,
        filter: &DiscoveryFilter,
    ) -> impl Future<Output = Result<Vec<DiscoveredPeripheral>, TransportError>> + Send;

    /// Establish a GATT connection to a peripheral from the last scan.
    fn connect(
        &self,
        id: &PeripheralId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Write a payload to a characteristic.
    fn write(
        &self,
        endpoint: GattEndpoint,
        payload: &Payload,
        mode: WriteMode,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Read a characteristic once, without subscribing to notifications.
    fn read(
        &self,
        endpoint: GattEndpoint,
    ) -> impl Future<Output = Result<Payload, TransportError>> + Send;

    /// Whether the underlying link is still up.
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    /// Drop the connection. Must succeed when nothing is connected.
    fn disconnect(&self) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// Builds a fresh [`Transport`] for each scan.
pub trait TransportFactory: Send + Sync + 'static {
    type Transport: Transport;

    fn create(&self) -> Self::Transport;
}
