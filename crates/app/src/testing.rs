//! In-memory transport and block channel used by the unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use blockbot_domain::codec::Command;
use blockbot_domain::device::GattEndpoint;
use blockbot_domain::filter::DiscoveryFilter;
use blockbot_domain::payload::{DiscoveredPeripheral, Payload, PeripheralId};
use blockbot_domain::sensor::SensorSnapshot;

use crate::blocks::BlockChannel;
use crate::channel::SendOutcome;
use crate::error::TransportError;
use crate::ports::{Transport, TransportFactory, WriteMode};

#[derive(Debug, Clone, Copy)]
pub enum WriteBehaviour {
    Immediate,
    Delay(Duration),
    Hang,
    Fail,
}

#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub endpoint: GattEndpoint,
    pub payload: Payload,
    pub mode: WriteMode,
    pub at: Instant,
}

impl WriteRecord {
    pub fn bytes(&self) -> Vec<u8> {
        self.payload.decode().unwrap()
    }
}

pub struct FakeState {
    peripherals: Vec<DiscoveredPeripheral>,
    write_behaviour: Mutex<WriteBehaviour>,
    writes: Mutex<Vec<WriteRecord>>,
    readings: Mutex<HashMap<GattEndpoint, Payload>>,
    last_filter: Mutex<Option<DiscoveryFilter>>,
    fail_scan: AtomicBool,
    connected: AtomicBool,
    created: AtomicUsize,
    reads: AtomicUsize,
    disconnects: AtomicUsize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            peripherals: vec![DiscoveredPeripheral {
                id: PeripheralId::new("fake-0"),
                local_name: Some("fake".to_string()),
                rssi: Some(-50),
            }],
            write_behaviour: Mutex::new(WriteBehaviour::Immediate),
            writes: Mutex::new(Vec::new()),
            readings: Mutex::new(HashMap::new()),
            last_filter: Mutex::new(None),
            fail_scan: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            created: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
            disconnects: AtomicUsize::new(0),
        }
    }
}

impl FakeState {
    pub fn set_write_behaviour(&self, behaviour: WriteBehaviour) {
        *self.write_behaviour.lock().unwrap() = behaviour;
    }

    pub fn set_reading(&self, endpoint: GattEndpoint, bytes: &[u8]) {
        self.readings
            .lock()
            .unwrap()
            .insert(endpoint, Payload::encode(bytes));
    }

    pub fn clear_reading(&self, endpoint: GattEndpoint) {
        self.readings.lock().unwrap().remove(&endpoint);
    }

    pub fn fail_scan(&self) {
        self.fail_scan.store(true, Ordering::SeqCst);
    }

    pub fn drop_link(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().unwrap().clone()
    }

    pub fn last_filter(&self) -> Option<DiscoveryFilter> {
        self.last_filter.lock().unwrap().clone()
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Default)]
pub struct FakeFactory {
    pub state: Arc<FakeState>,
}

impl TransportFactory for FakeFactory {
    type Transport = FakeTransport;

    fn create(&self) -> FakeTransport {
        self.state.created.fetch_add(1, Ordering::SeqCst);
        FakeTransport {
            state: Arc::clone(&self.state),
        }
    }
}

pub struct FakeTransport {
    state: Arc<FakeState>,
}

impl Transport for FakeTransport {
    async fn scan(
        &self,
        filter: &DiscoveryFilter,
    ) -> Result<Vec<DiscoveredPeripheral>, TransportError> {
        *self.state.last_filter.lock().unwrap() = Some(filter.clone());
        if self.state.fail_scan.load(Ordering::SeqCst) {
            return Err(TransportError::Unavailable);
        }
        Ok(self.state.peripherals.clone())
    }

    async fn connect(&self, id: &PeripheralId) -> Result<(), TransportError> {
        if !self.state.peripherals.iter().any(|p| &p.id == id) {
            return Err(TransportError::NotFound(id.clone()));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write(
        &self,
        endpoint: GattEndpoint,
        payload: &Payload,
        mode: WriteMode,
    ) -> Result<(), TransportError> {
        self.state.writes.lock().unwrap().push(WriteRecord {
            endpoint,
            payload: payload.clone(),
            mode,
            at: Instant::now(),
        });
        let behaviour = *self.state.write_behaviour.lock().unwrap();
        match behaviour {
            WriteBehaviour::Immediate => Ok(()),
            WriteBehaviour::Delay(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            WriteBehaviour::Hang => std::future::pending().await,
            WriteBehaviour::Fail => Err(TransportError::NotConnected),
        }
    }

    async fn read(&self, endpoint: GattEndpoint) -> Result<Payload, TransportError> {
        self.state.reads.fetch_add(1, Ordering::SeqCst);
        self.state
            .readings
            .lock()
            .unwrap()
            .get(&endpoint)
            .cloned()
            .ok_or(TransportError::MissingCharacteristic(endpoint))
    }

    async fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.state.disconnects.fetch_add(1, Ordering::SeqCst);
        self.state.connected.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentCommand {
    pub bytes: Vec<u8>,
    pub at: Instant,
}

/// A [`BlockChannel`] that records every command it is asked to send.
#[derive(Default)]
pub struct RecordingChannel {
    sent: Mutex<Vec<SentCommand>>,
    snapshot: Mutex<SensorSnapshot>,
}

impl RecordingChannel {
    pub fn sent(&self) -> Vec<SentCommand> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_snapshot(&self, snapshot: SensorSnapshot) {
        *self.snapshot.lock().unwrap() = snapshot;
    }
}

impl BlockChannel for RecordingChannel {
    fn send_command(&self, command: &Command) -> SendOutcome {
        self.sent.lock().unwrap().push(SentCommand {
            bytes: command.encode(),
            at: Instant::now(),
        });
        SendOutcome::Dispatched
    }

    fn last_reading(&self) -> SensorSnapshot {
        *self.snapshot.lock().unwrap()
    }
}
