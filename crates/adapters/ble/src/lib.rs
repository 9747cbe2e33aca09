//! # blockbot-adapter-ble
//!
//! BLE adapter: implements the `Transport` port on top of `btleplug`.
//!
//! ## How it works
//!
//! A [`BtleTransport`] is created per scan. The first operation opens the
//! host's first Bluetooth adapter; a scan listens for advertisements for the
//! configured duration and keeps peripherals whose local name passes the
//! discovery filter. `connect` then connects and discovers services, after
//! which writes and reads resolve a characteristic by its
//! `{service, characteristic}` UUID pair.
//!
//! Payloads arrive base64-encoded from the channel and are decoded here, at
//! the radio boundary.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `blockbot-app` and `blockbot-domain`.

mod config;
mod error;
mod gatt;
mod scanner;

pub use config::BleConfig;
pub use error::BleError;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use btleplug::api::{Manager as _, Peripheral as _};
use btleplug::platform::{Adapter, Manager, Peripheral};
use tokio::sync::OnceCell;

use blockbot_app::error::TransportError;
use blockbot_app::ports::{Transport, TransportFactory, WriteMode};
use blockbot_domain::device::GattEndpoint;
use blockbot_domain::filter::DiscoveryFilter;
use blockbot_domain::payload::{DiscoveredPeripheral, Payload, PeripheralId};

/// Builds a [`BtleTransport`] per scan.
#[derive(Debug, Clone, Default)]
pub struct BtleTransportFactory {
    config: BleConfig,
}

impl BtleTransportFactory {
    #[must_use]
    pub fn new(config: BleConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for BtleTransportFactory {
    type Transport = BtleTransport;

    fn create(&self) -> BtleTransport {
        BtleTransport::new(self.config.clone())
    }
}

/// A BLE session against one peripheral at a time.
pub struct BtleTransport {
    config: BleConfig,
    central: OnceCell<Adapter>,
    /// Peripherals returned by the last scan, by id.
    seen: Mutex<HashMap<PeripheralId, Peripheral>>,
    connected: Mutex<Option<Peripheral>>,
}

impl BtleTransport {
    #[must_use]
    pub fn new(config: BleConfig) -> Self {
        Self {
            config,
            central: OnceCell::new(),
            seen: Mutex::new(HashMap::new()),
            connected: Mutex::new(None),
        }
    }

    async fn central(&self) -> Result<&Adapter, BleError> {
        self.central
            .get_or_try_init(|| async {
                let manager = Manager::new().await?;
                let adapters = manager.adapters().await?;
                let central = adapters.into_iter().next().ok_or(BleError::NotAvailable)?;
                tracing::debug!("BLE adapter opened");
                Ok::<_, BleError>(central)
            })
            .await
    }

    fn seen(&self) -> MutexGuard<'_, HashMap<PeripheralId, Peripheral>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connected(&self) -> MutexGuard<'_, Option<Peripheral>> {
        self.connected.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connected_peripheral(&self) -> Result<Peripheral, BleError> {
        self.connected().clone().ok_or(BleError::NotConnected)
    }

    #[tracing::instrument(skip_all, fields(filter = ?filter.name))]
    async fn run_scan(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<DiscoveredPeripheral>, BleError> {
        let central = self.central().await?;
        tracing::info!(
            duration_secs = self.config.scan_duration_secs,
            "BLE scan started"
        );

        let found = scanner::run_scan(central, filter, self.config.scan_duration()).await?;
        tracing::info!(count = found.len(), "BLE scan complete");

        let mut seen = self.seen();
        seen.clear();
        Ok(found
            .into_iter()
            .map(|hit| {
                seen.insert(hit.discovered.id.clone(), hit.peripheral);
                hit.discovered
            })
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn run_connect(&self, id: &PeripheralId) -> Result<(), BleError> {
        let peripheral = self
            .seen()
            .get(id)
            .cloned()
            .ok_or_else(|| BleError::UnknownPeripheral(id.clone()))?;

        gatt::connect(&peripheral, self.config.connect_timeout()).await?;
        tracing::info!("BLE peripheral connected");
        *self.connected() = Some(peripheral);
        Ok(())
    }

    async fn run_write(
        &self,
        endpoint: GattEndpoint,
        bytes: &[u8],
        mode: WriteMode,
    ) -> Result<(), BleError> {
        let peripheral = self.connected_peripheral()?;
        let characteristic = gatt::find_characteristic(&peripheral, endpoint)?;
        peripheral
            .write(&characteristic, bytes, gatt::write_type(mode))
            .await?;
        Ok(())
    }

    async fn run_read(&self, endpoint: GattEndpoint) -> Result<Vec<u8>, BleError> {
        let peripheral = self.connected_peripheral()?;
        let characteristic = gatt::find_characteristic(&peripheral, endpoint)?;
        Ok(peripheral.read(&characteristic).await?)
    }
}

impl Transport for BtleTransport {
    async fn scan(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<DiscoveredPeripheral>, TransportError> {
        Ok(self.run_scan(filter).await?)
    }

    async fn connect(&self, id: &PeripheralId) -> Result<(), TransportError> {
        Ok(self.run_connect(id).await?)
    }

    async fn write(
        &self,
        endpoint: GattEndpoint,
        payload: &Payload,
        mode: WriteMode,
    ) -> Result<(), TransportError> {
        let bytes = payload.decode()?;
        Ok(self.run_write(endpoint, &bytes, mode).await?)
    }

    async fn read(&self, endpoint: GattEndpoint) -> Result<Payload, TransportError> {
        let bytes = self.run_read(endpoint).await?;
        Ok(Payload::encode(&bytes))
    }

    async fn is_connected(&self) -> bool {
        let Some(peripheral) = self.connected().clone() else {
            return false;
        };
        peripheral.is_connected().await.unwrap_or(false)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(peripheral) = self.connected().take() else {
            return Ok(());
        };
        peripheral
            .disconnect()
            .await
            .map_err(|err| BleError::from(err).into_transport())?;
        tracing::info!("BLE peripheral disconnected");
        Ok(())
    }
}
