//! # blockbot-adapter-virtual
//!
//! Virtual/demo transport that simulates a classroom bench of block
//! peripherals, for testing and demonstration without a radio.
//!
//! ## Provided devices
//!
//! | Kind | Advertised name (group `3`) | Behaviour |
//! |------|-----------------------------|-----------|
//! | DC motor A | `DC Motor-3` | Stores the last motor command |
//! | DC motor B | `DC Motor-3-B` | Stores the last motor command |
//! | RGB lamp | `MASTER-3` | Stores the last colour |
//! | LED matrix | `DOT MATRIX-3` | Stores the last bitmap, readable back |
//! | Buzzer | `BUZZER-3-1` | Stores the last note |
//! | Light/touch | `LIGHT TOUCH-3` | Returns programmed light and touch bytes |
//! | Proximity | `PROXIMITY` | Returns a programmed proximity byte |
//!
//! Without a group every device advertises its plain name.
//!
//! ## Dependency rule
//!
//! Depends on `blockbot-app` (port traits) and `blockbot-domain` only.

mod devices;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use blockbot_app::error::TransportError;
use blockbot_app::ports::{Transport, TransportFactory, WriteMode};
use blockbot_domain::device::{DeviceKind, GattEndpoint, GroupPolicy};
use blockbot_domain::filter::{DiscoveryFilter, GroupKey};
use blockbot_domain::payload::{DiscoveredPeripheral, Payload, PeripheralId};

use devices::{VirtualDevice, VirtualPeripheral};

/// One write as the simulated radio received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteLogEntry {
    pub peripheral: PeripheralId,
    pub endpoint: GattEndpoint,
    pub bytes: Vec<u8>,
}

struct BenchInner {
    peripherals: Vec<VirtualPeripheral>,
    log: Mutex<Vec<WriteLogEntry>>,
    write_latency: Mutex<Duration>,
}

/// The simulated world shared by every transport it creates.
#[derive(Clone)]
pub struct VirtualBench {
    inner: Arc<BenchInner>,
}

impl VirtualBench {
    /// One device of every kind, named for `group`.
    #[must_use]
    pub fn classroom(group: Option<&GroupKey>) -> Self {
        let peripherals = DeviceKind::ALL
            .into_iter()
            .map(|kind| VirtualPeripheral {
                id: PeripheralId::new(format!("virtual-{kind}")),
                local_name: local_name(kind, group),
                rssi: -40,
                kind,
                device: VirtualDevice::for_kind(kind),
            })
            .collect();

        Self {
            inner: Arc::new(BenchInner {
                peripherals,
                log: Mutex::new(Vec::new()),
                write_latency: Mutex::new(Duration::ZERO),
            }),
        }
    }

    #[must_use]
    pub fn factory(&self) -> VirtualTransportFactory {
        VirtualTransportFactory {
            bench: self.clone(),
        }
    }

    /// Advertised names on the bench, in kind order.
    #[must_use]
    pub fn advertised(&self) -> Vec<(DeviceKind, String)> {
        self.inner
            .peripherals
            .iter()
            .map(|p| (p.kind, p.local_name.clone()))
            .collect()
    }

    /// Program a sensor reading. Returns `false` if no sensor has `endpoint`.
    pub fn set_sensor(&self, endpoint: GattEndpoint, bytes: &[u8]) -> bool {
        self.inner.peripherals.iter().any(|p| match &p.device {
            VirtualDevice::Sensor(sensor) => sensor.set(endpoint, bytes),
            VirtualDevice::Actuator(_) => false,
        })
    }

    /// Current value of the first device exposing `endpoint`.
    #[must_use]
    pub fn value(&self, endpoint: GattEndpoint) -> Option<Vec<u8>> {
        self.inner
            .peripherals
            .iter()
            .find_map(|p| p.device.read(endpoint))
    }

    #[must_use]
    pub fn write_log(&self) -> Vec<WriteLogEntry> {
        self.log().clone()
    }

    /// Delay every write by `latency` before it is acknowledged.
    pub fn set_write_latency(&self, latency: Duration) {
        *self
            .inner
            .write_latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = latency;
    }

    fn write_latency(&self) -> Duration {
        *self
            .inner
            .write_latency
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn log(&self) -> MutexGuard<'_, Vec<WriteLogEntry>> {
        self.inner.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn peripheral(&self, id: &PeripheralId) -> Option<&VirtualPeripheral> {
        self.inner.peripherals.iter().find(|p| &p.id == id)
    }
}

fn local_name(kind: DeviceKind, group: Option<&GroupKey>) -> String {
    let identity = kind.identity();
    let base = identity.advertised_name;
    match (group, identity.group_policy) {
        (None, _) | (Some(_), GroupPolicy::Ignore) => base.to_string(),
        (Some(group), GroupPolicy::ExactSuffix) => format!("{base}-{group}"),
        (Some(group), GroupPolicy::PrefixSuffix) => match kind {
            DeviceKind::DcMotorB => format!("{base}-{group}-B"),
            _ => format!("{base}-{group}-1"),
        },
    }
}

/// Builds a [`VirtualTransport`] bound to a bench.
#[derive(Clone)]
pub struct VirtualTransportFactory {
    bench: VirtualBench,
}

impl TransportFactory for VirtualTransportFactory {
    type Transport = VirtualTransport;

    fn create(&self) -> VirtualTransport {
        VirtualTransport {
            bench: self.bench.clone(),
            seen: Mutex::new(Vec::new()),
            connected: Mutex::new(None),
        }
    }
}

/// A simulated BLE session.
pub struct VirtualTransport {
    bench: VirtualBench,
    seen: Mutex<Vec<PeripheralId>>,
    connected: Mutex<Option<PeripheralId>>,
}

impl VirtualTransport {
    fn connected_id(&self) -> Result<PeripheralId, TransportError> {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(TransportError::NotConnected)
    }
}

impl Transport for VirtualTransport {
    async fn scan(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<DiscoveredPeripheral>, TransportError> {
        let found: Vec<DiscoveredPeripheral> = self
            .bench
            .inner
            .peripherals
            .iter()
            .filter(|p| filter.matches(Some(p.local_name.as_str())))
            .map(|p| DiscoveredPeripheral {
                id: p.id.clone(),
                local_name: Some(p.local_name.clone()),
                rssi: Some(p.rssi),
            })
            .collect();

        tracing::debug!(filter = ?filter.name, count = found.len(), "virtual scan");
        *self.seen.lock().unwrap_or_else(PoisonError::into_inner) =
            found.iter().map(|p| p.id.clone()).collect();
        Ok(found)
    }

    async fn connect(&self, id: &PeripheralId) -> Result<(), TransportError> {
        let seen = self
            .seen
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id);
        if !seen {
            return Err(TransportError::NotFound(id.clone()));
        }
        *self.connected.lock().unwrap_or_else(PoisonError::into_inner) = Some(id.clone());
        tracing::debug!(%id, "virtual peripheral connected");
        Ok(())
    }

    async fn write(
        &self,
        endpoint: GattEndpoint,
        payload: &Payload,
        _mode: WriteMode,
    ) -> Result<(), TransportError> {
        let id = self.connected_id()?;
        let bytes = payload.decode()?;
        let peripheral = self
            .bench
            .peripheral(&id)
            .ok_or_else(|| TransportError::NotFound(id.clone()))?;
        if peripheral.device.read(endpoint).is_none() {
            return Err(TransportError::MissingCharacteristic(endpoint));
        }

        self.bench.log().push(WriteLogEntry {
            peripheral: id,
            endpoint,
            bytes: bytes.clone(),
        });

        let latency = self.bench.write_latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if peripheral.device.write(endpoint, &bytes) {
            Ok(())
        } else {
            Err(TransportError::MissingCharacteristic(endpoint))
        }
    }

    async fn read(&self, endpoint: GattEndpoint) -> Result<Payload, TransportError> {
        let id = self.connected_id()?;
        self.bench
            .peripheral(&id)
            .and_then(|p| p.device.read(endpoint))
            .map(|bytes| Payload::encode(&bytes))
            .ok_or(TransportError::MissingCharacteristic(endpoint))
    }

    async fn is_connected(&self) -> bool {
        self.connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if let Some(id) = self
            .connected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            tracing::debug!(%id, "virtual peripheral disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockbot_domain::device::{DC_MOTOR_A, DOT_MATRIX, LIGHT, PROXIMITY, RGB_LAMP};
    use blockbot_domain::filter::NameFilter;

    fn filter(kind: DeviceKind, group: Option<&GroupKey>) -> DiscoveryFilter {
        DiscoveryFilter::build(&kind.identity(), group)
    }

    async fn connected(
        bench: &VirtualBench,
        kind: DeviceKind,
        group: Option<&GroupKey>,
    ) -> VirtualTransport {
        let transport = bench.factory().create();
        let found = transport.scan(&filter(kind, group)).await.unwrap();
        transport.connect(&found[0].id).await.unwrap();
        transport
    }

    #[test]
    fn should_name_devices_for_group() {
        let group = GroupKey::new("3");
        let bench = VirtualBench::classroom(group.as_ref());
        let names: Vec<String> = bench.advertised().into_iter().map(|(_, n)| n).collect();
        assert_eq!(
            names,
            vec![
                "DC Motor-3",
                "DC Motor-3-B",
                "MASTER-3",
                "DOT MATRIX-3",
                "BUZZER-3-1",
                "LIGHT TOUCH-3",
                "PROXIMITY",
            ]
        );
    }

    #[tokio::test]
    async fn should_find_only_exact_match_for_first_motor() {
        let group = GroupKey::new("3");
        let bench = VirtualBench::classroom(group.as_ref());
        let transport = bench.factory().create();

        let found = transport
            .scan(&filter(DeviceKind::DcMotorA, group.as_ref()))
            .await
            .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].local_name.as_deref(), Some("DC Motor-3"));
    }

    #[tokio::test]
    async fn should_find_prefixed_second_motor() {
        let group = GroupKey::new("3");
        let bench = VirtualBench::classroom(group.as_ref());
        let transport = bench.factory().create();
        let filter = filter(DeviceKind::DcMotorB, group.as_ref());
        assert_eq!(filter.name, NameFilter::Prefix("DC Motor-3".to_string()));

        let found = transport.scan(&filter).await.unwrap();

        assert!(found.iter().any(|p| p.local_name.as_deref() == Some("DC Motor-3-B")));
    }

    #[tokio::test]
    async fn should_find_nothing_for_other_group() {
        let bench = VirtualBench::classroom(GroupKey::new("3").as_ref());
        let transport = bench.factory().create();

        let found = transport
            .scan(&filter(DeviceKind::RgbLamp, GroupKey::new("4").as_ref()))
            .await
            .unwrap();

        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn should_reject_connect_to_unscanned_peripheral() {
        let bench = VirtualBench::classroom(None);
        let transport = bench.factory().create();

        let result = transport.connect(&PeripheralId::new("virtual-rgb_lamp")).await;

        assert!(matches!(result, Err(TransportError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_log_and_store_writes() {
        let bench = VirtualBench::classroom(None);
        let transport = connected(&bench, DeviceKind::RgbLamp, None).await;

        transport
            .write(RGB_LAMP, &Payload::encode(&[10, 20, 30]), WriteMode::WithResponse)
            .await
            .unwrap();

        assert_eq!(
            bench.write_log(),
            vec![WriteLogEntry {
                peripheral: PeripheralId::new("virtual-rgb_lamp"),
                endpoint: RGB_LAMP,
                bytes: vec![10, 20, 30],
            }]
        );
        assert_eq!(bench.value(RGB_LAMP), Some(vec![10, 20, 30]));
    }

    #[tokio::test]
    async fn should_read_back_matrix_rows() {
        let bench = VirtualBench::classroom(None);
        let transport = connected(&bench, DeviceKind::DotMatrix, None).await;
        let rows = [0x00, 0x36, 0xFF, 0xFF, 0x7E, 0x3C, 0x18, 0x00];

        transport
            .write(DOT_MATRIX, &Payload::encode(&rows), WriteMode::WithResponse)
            .await
            .unwrap();
        let payload = transport.read(DOT_MATRIX).await.unwrap();

        assert_eq!(payload.decode().unwrap(), rows.to_vec());
    }

    #[tokio::test]
    async fn should_reject_write_to_other_device_endpoint() {
        let bench = VirtualBench::classroom(None);
        let transport = connected(&bench, DeviceKind::RgbLamp, None).await;

        let result = transport
            .write(DC_MOTOR_A, &Payload::encode(&[255, 0]), WriteMode::WithResponse)
            .await;

        assert!(matches!(result, Err(TransportError::MissingCharacteristic(_))));
        assert!(bench.write_log().is_empty());
    }

    #[tokio::test]
    async fn should_return_programmed_sensor_values() {
        let bench = VirtualBench::classroom(None);
        assert!(bench.set_sensor(LIGHT, &[10, 2]));
        assert!(bench.set_sensor(PROXIMITY, &[1]));
        let transport = connected(&bench, DeviceKind::LightTouch, None).await;

        let payload = transport.read(LIGHT).await.unwrap();

        assert_eq!(payload.decode().unwrap(), vec![10, 2]);
        assert!(transport.read(PROXIMITY).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn should_delay_write_acknowledgement() {
        let bench = VirtualBench::classroom(None);
        bench.set_write_latency(Duration::from_millis(300));
        let transport = connected(&bench, DeviceKind::RgbLamp, None).await;
        let start = tokio::time::Instant::now();

        transport
            .write(RGB_LAMP, &Payload::encode(&[1, 1, 1]), WriteMode::WithResponse)
            .await
            .unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn should_refuse_io_after_disconnect() {
        let bench = VirtualBench::classroom(None);
        let transport = connected(&bench, DeviceKind::RgbLamp, None).await;

        transport.disconnect().await.unwrap();

        assert!(!transport.is_connected().await);
        let result = transport
            .write(RGB_LAMP, &Payload::encode(&[1, 2, 3]), WriteMode::WithResponse)
            .await;
        assert!(matches!(result, Err(TransportError::NotConnected)));
        assert!(transport.disconnect().await.is_ok());
    }
}
