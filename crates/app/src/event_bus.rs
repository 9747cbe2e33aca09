//! In-process channel event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use blockbot_domain::payload::{DiscoveredPeripheral, PeripheralId};
use blockbot_domain::sensor::SensorSnapshot;

/// Lifecycle and telemetry notifications emitted by a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A scan found a candidate peripheral for the user to pick.
    Discovered(DiscoveredPeripheral),
    Connected(PeripheralId),
    Disconnected,
    /// A write did not resolve before the busy deadline.
    WriteTimedOut,
    /// A poll cycle refreshed the sensor snapshot.
    Reading(SensorSnapshot),
}

/// Event bus using a tokio [`broadcast`] channel.
///
/// Publishing succeeds even when there are no active subscribers
/// (the event is simply dropped).
#[derive(Debug, Clone)]
pub struct ChannelEventBus {
    sender: broadcast::Sender<ChannelEvent>,
}

impl ChannelEventBus {
    /// Create a new event bus with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events published *after* this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: ChannelEvent) {
        // broadcast::send fails only when there are zero receivers.
        let _ = self.sender.send(event);
    }
}
