//! Peripheral channel: the per-device connection state machine.
//!
//! A [`PeripheralChannel`] owns one transport at a time and moves through
//! `Disconnected → Scanning → Connected → Disconnected`. It serializes
//! outbound writes behind a busy lock (at most one write in flight; extra
//! sends are dropped, never queued) and caches the last sensor snapshot fed
//! by the telemetry poller.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use blockbot_domain::codec::Command;
use blockbot_domain::device::{DeviceIdentity, DeviceKind, GattEndpoint, TelemetryPlan};
use blockbot_domain::filter::DiscoveryFilter;
use blockbot_domain::payload::{DiscoveredPeripheral, Payload, PeripheralId};
use blockbot_domain::sensor::SensorSnapshot;

use crate::error::ChannelError;
use crate::event_bus::{ChannelEvent, ChannelEventBus};
use crate::ports::{GroupKeySource, Transport, TransportFactory, WriteMode};
use crate::telemetry;

/// How long a write may stay unresolved before the busy lock is released.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

const EVENT_CAPACITY: usize = 64;

/// Connection lifecycle of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Scanning,
    Connected,
}

/// What happened to a [`PeripheralChannel::send`] call.
///
/// Only [`Dispatched`](Self::Dispatched) reaches the radio; every other
/// outcome is a silent drop from the script's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Dispatched,
    Busy,
    NotConnected,
    /// The device kind has no command characteristic.
    NotWritable,
}

struct BusyLock {
    write_id: u64,
    deadline: Instant,
    task: JoinHandle<()>,
}

struct Inner<T> {
    transport: Option<Arc<T>>,
    connection: ConnectionState,
    busy: Option<BusyLock>,
    poll: Option<JoinHandle<()>>,
    next_write_id: u64,
}

impl<T> Inner<T> {
    /// Abort the poller and any in-flight write.
    fn stop_tasks(&mut self) {
        if let Some(poll) = self.poll.take() {
            poll.abort();
        }
        if let Some(busy) = self.busy.take() {
            busy.task.abort();
        }
    }
}

/// State shared between the channel and the tasks it spawns.
pub(crate) struct Shared<T> {
    inner: Mutex<Inner<T>>,
    readings: watch::Sender<SensorSnapshot>,
    events: ChannelEventBus,
}

impl<T: Transport> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The transport, only while connected.
    pub(crate) fn connected_transport(&self) -> Option<Arc<T>> {
        let inner = self.lock();
        if inner.connection == ConnectionState::Connected {
            inner.transport.clone()
        } else {
            None
        }
    }

    /// Release the busy lock if it still belongs to `write_id`.
    fn release_busy(&self, write_id: u64) {
        let mut inner = self.lock();
        if inner
            .busy
            .as_ref()
            .is_some_and(|busy| busy.write_id == write_id)
        {
            inner.busy = None;
        }
    }

    pub(crate) fn update_reading(&self, apply: impl FnOnce(&mut SensorSnapshot)) {
        self.readings.send_modify(apply);
        self.events
            .publish(ChannelEvent::Reading(*self.readings.borrow()));
    }
}

/// Command channel to one physical peripheral.
///
/// `F` builds a fresh transport on every scan; `K` supplies the classroom
/// group key used to qualify the advertised name.
pub struct PeripheralChannel<F: TransportFactory, K> {
    kind: DeviceKind,
    identity: DeviceIdentity,
    factory: F,
    group_keys: K,
    shared: Arc<Shared<F::Transport>>,
}

impl<F: TransportFactory, K: GroupKeySource> PeripheralChannel<F, K> {
    #[must_use]
    pub fn new(kind: DeviceKind, factory: F, group_keys: K) -> Self {
        let (readings, _) = watch::channel(SensorSnapshot::default());
        Self {
            kind,
            identity: kind.identity(),
            factory,
            group_keys,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    transport: None,
                    connection: ConnectionState::Disconnected,
                    busy: None,
                    poll: None,
                    next_write_id: 0,
                }),
                readings,
                events: ChannelEventBus::new(EVENT_CAPACITY),
            }),
        }
    }

    #[must_use]
    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.lock().connection
    }

    #[must_use]
    pub fn events(&self) -> &ChannelEventBus {
        &self.shared.events
    }

    /// Replace the transport and discover matching peripherals.
    ///
    /// Any existing connection is torn down first. Every match is also
    /// published as [`ChannelEvent::Discovered`]; picking one is left to
    /// the caller.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Transport`] if the scan itself fails.
    #[tracing::instrument(skip(self), fields(device = %self.kind))]
    pub async fn scan(&self) -> Result<Vec<DiscoveredPeripheral>, ChannelError> {
        self.disconnect().await;

        let transport = Arc::new(self.factory.create());
        let group = self.group_keys.group_key();
        let filter = DiscoveryFilter::build(&self.identity, group.as_ref());
        {
            let mut inner = self.shared.lock();
            inner.transport = Some(Arc::clone(&transport));
            inner.connection = ConnectionState::Scanning;
        }

        tracing::info!(
            filter = ?filter.name,
            group = ?group.as_ref().map(|g| g.as_str()),
            "scan started"
        );

        let found = match transport.scan(&filter).await {
            Ok(found) => found,
            Err(err) => {
                tracing::warn!(%err, "scan failed");
                let mut inner = self.shared.lock();
                if inner.connection == ConnectionState::Scanning {
                    inner.connection = ConnectionState::Disconnected;
                }
                return Err(err.into());
            }
        };

        tracing::info!(count = found.len(), "scan complete");
        for peripheral in &found {
            self.shared
                .events
                .publish(ChannelEvent::Discovered(peripheral.clone()));
        }
        Ok(found)
    }

    /// Connect to a peripheral returned by the last [`scan`](Self::scan).
    ///
    /// A link already open on this transport is torn down first, together
    /// with its poller and in-flight write. On success the sensor snapshot is
    /// reset and telemetry polling starts for device kinds that have sensors.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::NoTransport`] without a prior scan, or
    /// [`ChannelError::Transport`] if the connection attempt fails.
    #[tracing::instrument(skip(self), fields(device = %self.kind))]
    pub async fn connect(&self, id: &PeripheralId) -> Result<(), ChannelError> {
        let (transport, was_connected) = {
            let mut inner = self.shared.lock();
            let transport = inner.transport.clone().ok_or(ChannelError::NoTransport)?;
            inner.stop_tasks();
            let was_connected = inner.connection == ConnectionState::Connected;
            if was_connected {
                inner.connection = ConnectionState::Disconnected;
            }
            (transport, was_connected)
        };

        if was_connected {
            if let Err(err) = transport.disconnect().await {
                tracing::warn!(%err, "disconnecting previous link failed");
            }
            tracing::info!("previous peripheral disconnected");
            self.shared.events.publish(ChannelEvent::Disconnected);
        }

        if let Err(err) = transport.connect(id).await {
            tracing::warn!(%err, %id, "connect failed");
            self.shared.lock().connection = ConnectionState::Disconnected;
            return Err(err.into());
        }

        {
            let mut inner = self.shared.lock();
            let current = inner
                .transport
                .as_ref()
                .is_some_and(|t| Arc::ptr_eq(t, &transport));
            if !current {
                // torn down or rescanned while connecting
                return Err(ChannelError::NoTransport);
            }
            inner.connection = ConnectionState::Connected;
        }

        self.shared.readings.send_replace(SensorSnapshot::default());
        tracing::info!(%id, "peripheral connected");
        self.shared.events.publish(ChannelEvent::Connected(id.clone()));
        self.on_connected();
        Ok(())
    }

    fn on_connected(&self) {
        if let Some(plan) = self.kind.telemetry() {
            self.start_polling(plan);
        }
    }

    /// Start (or restart) fixed-interval sensor reads.
    pub fn start_polling(&self, plan: TelemetryPlan) {
        tracing::debug!(
            device = %self.kind,
            interval_ms = plan.interval.as_millis(),
            "telemetry polling started"
        );
        let handle = telemetry::spawn_poller(Arc::clone(&self.shared), plan);
        if let Some(previous) = self.shared.lock().poll.replace(handle) {
            previous.abort();
        }
    }

    /// Cancel polling and any in-flight write, then drop the transport.
    ///
    /// Safe to call in any state.
    #[tracing::instrument(skip(self), fields(device = %self.kind))]
    pub async fn disconnect(&self) {
        let (transport, previous) = {
            let mut inner = self.shared.lock();
            inner.stop_tasks();
            let previous = std::mem::replace(&mut inner.connection, ConnectionState::Disconnected);
            (inner.transport.take(), previous)
        };

        if let Some(transport) = transport {
            if let Err(err) = transport.disconnect().await {
                tracing::warn!(%err, "transport disconnect failed");
            }
        }

        if previous == ConnectionState::Connected {
            tracing::info!("peripheral disconnected");
            self.shared.events.publish(ChannelEvent::Disconnected);
        }
    }

    /// Connected according to both the channel and the transport.
    pub async fn is_connected(&self) -> bool {
        let Some(transport) = self.shared.connected_transport() else {
            return false;
        };
        transport.is_connected().await
    }

    /// Write raw bytes to the command characteristic.
    ///
    /// Returns immediately. The write runs in the background against a
    /// [`BUSY_TIMEOUT`] deadline; its result is logged, never returned.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn send(&self, bytes: &[u8]) -> SendOutcome {
        let Some(endpoint) = self.identity.command else {
            tracing::debug!(device = %self.kind, "send ignored, device takes no commands");
            return SendOutcome::NotWritable;
        };

        let mut inner = self.shared.lock();
        let transport = match (&inner.transport, inner.connection) {
            (Some(transport), ConnectionState::Connected) => Arc::clone(transport),
            _ => {
                tracing::debug!(device = %self.kind, "send ignored, not connected");
                return SendOutcome::NotConnected;
            }
        };
        if inner.busy.is_some() {
            tracing::debug!(device = %self.kind, "send dropped, previous write still in flight");
            return SendOutcome::Busy;
        }

        inner.next_write_id += 1;
        let write_id = inner.next_write_id;
        let payload = Payload::encode(bytes);
        let task = tokio::spawn(write_task(
            Arc::clone(&self.shared),
            transport,
            endpoint,
            payload,
            write_id,
        ));
        inner.busy = Some(BusyLock {
            write_id,
            deadline: Instant::now() + BUSY_TIMEOUT,
            task,
        });
        SendOutcome::Dispatched
    }

    /// Encode a command with its codec and [`send`](Self::send) it.
    pub fn send_command(&self, command: &Command) -> SendOutcome {
        self.send(&command.encode())
    }

    /// Read one endpoint once. `None` when not connected or on failure.
    pub async fn read(&self, endpoint: GattEndpoint) -> Option<Vec<u8>> {
        let transport = self.shared.connected_transport()?;
        match transport.read(endpoint).await {
            Ok(payload) => Some(payload.decode_lossy()),
            Err(err) => {
                tracing::debug!(%err, %endpoint, "read failed");
                None
            }
        }
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.shared.lock().busy.is_some()
    }

    /// When the current busy lock will be force-released, if one is held.
    #[must_use]
    pub fn busy_deadline(&self) -> Option<Instant> {
        self.shared.lock().busy.as_ref().map(|busy| busy.deadline)
    }

    /// Last decoded sensor values; zero values until the first poll.
    #[must_use]
    pub fn last_reading(&self) -> SensorSnapshot {
        *self.shared.readings.borrow()
    }

    /// Watch the sensor snapshot for changes.
    #[must_use]
    pub fn subscribe_readings(&self) -> watch::Receiver<SensorSnapshot> {
        self.shared.readings.subscribe()
    }
}

impl<F: TransportFactory, K> Drop for PeripheralChannel<F, K> {
    fn drop(&mut self) {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stop_tasks();
    }
}

async fn write_task<T: Transport>(
    shared: Arc<Shared<T>>,
    transport: Arc<T>,
    endpoint: GattEndpoint,
    payload: Payload,
    write_id: u64,
) {
    let write = transport.write(endpoint, &payload, WriteMode::WithResponse);
    match tokio::time::timeout(BUSY_TIMEOUT, write).await {
        Ok(Ok(())) => tracing::trace!(%endpoint, "write acknowledged"),
        Ok(Err(err)) => tracing::warn!(%err, %endpoint, "write failed"),
        Err(_) => {
            tracing::warn!(%endpoint, "write unresolved after deadline, releasing busy lock");
            shared.events.publish(ChannelEvent::WriteTimedOut);
        }
    }
    shared.release_busy(write_id);
}
