//! Application error types.

use blockbot_domain::device::GattEndpoint;
use blockbot_domain::error::DomainError;
use blockbot_domain::payload::PeripheralId;

/// Errors reported by a [`Transport`](crate::ports::transport::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No BLE adapter is present on the host.
    #[error("no BLE adapter available")]
    Unavailable,

    /// The peripheral id was not produced by this transport's last scan.
    #[error("peripheral {0} not found")]
    NotFound(PeripheralId),

    /// The operation needs a connected peripheral.
    #[error("peripheral not connected")]
    NotConnected,

    /// The connected peripheral does not expose the endpoint.
    #[error("characteristic {0} not available")]
    MissingCharacteristic(GattEndpoint),

    /// A payload could not be decoded.
    #[error("invalid payload")]
    Payload(#[from] DomainError),

    /// Backend-specific failure (radio stack, simulator, …).
    #[error("transport backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Errors surfaced by [`PeripheralChannel`](crate::channel::PeripheralChannel)
/// lifecycle operations.
///
/// Command and telemetry paths never return these; they drop silently.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// `connect` was called without a transport from a previous `scan`.
    #[error("no transport available, scan first")]
    NoTransport,

    /// The transport failed.
    #[error("transport error")]
    Transport(#[from] TransportError),
}
