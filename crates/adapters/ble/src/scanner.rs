//! Timed scan that collects peripherals whose local name passes a
//! [`DiscoveryFilter`].
//!
//! The platform scan filter only understands service UUIDs, and block
//! peripherals do not advertise theirs, so the scan runs unfiltered and the
//! name match happens here.

use std::time::Duration;

use btleplug::api::{Central, CentralEvent, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Peripheral, PeripheralId as PlatformId};
use tokio_stream::StreamExt as _;

use blockbot_domain::filter::DiscoveryFilter;
use blockbot_domain::payload::{DiscoveredPeripheral, PeripheralId};

use crate::error::BleError;

/// A scan hit, with the platform handle needed to connect later.
pub(crate) struct Found {
    pub discovered: DiscoveredPeripheral,
    pub peripheral: Peripheral,
}

/// Listen for advertisements for `duration` and return every match.
///
/// # Errors
///
/// Returns [`BleError::Stack`] when the scan cannot be started or stopped.
pub(crate) async fn run_scan(
    central: &Adapter,
    filter: &DiscoveryFilter,
    duration: Duration,
) -> Result<Vec<Found>, BleError> {
    let mut events = central.events().await?;
    central.start_scan(ScanFilter::default()).await?;

    let mut found: Vec<Found> = Vec::new();
    let deadline = tokio::time::Instant::now() + duration;

    while tokio::time::Instant::now() < deadline {
        let remaining = deadline - tokio::time::Instant::now();
        match tokio::time::timeout(remaining, events.next()).await {
            Ok(Some(CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id))) => {
                if let Some(hit) = inspect(central, &id, filter).await {
                    remember(&mut found, hit);
                }
            }
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => break,
        }
    }

    central.stop_scan().await?;

    // Peripherals cached by the OS from an earlier scan may not raise a
    // discovery event again.
    for peripheral in central.peripherals().await? {
        if let Some(hit) = inspect(central, &peripheral.id(), filter).await {
            remember(&mut found, hit);
        }
    }

    Ok(found)
}

async fn inspect(central: &Adapter, id: &PlatformId, filter: &DiscoveryFilter) -> Option<Found> {
    let peripheral = central.peripheral(id).await.ok()?;
    let props = peripheral.properties().await.ok()??;
    if !filter.matches(props.local_name.as_deref()) {
        tracing::trace!(name = ?props.local_name, "advertisement ignored");
        return None;
    }

    tracing::debug!(name = ?props.local_name, rssi = ?props.rssi, "matching peripheral found");
    Some(Found {
        discovered: DiscoveredPeripheral {
            id: PeripheralId::new(id.to_string()),
            local_name: props.local_name,
            rssi: props.rssi,
        },
        peripheral,
    })
}

/// Keep the newest advertisement per peripheral.
fn remember(found: &mut Vec<Found>, hit: Found) {
    match found
        .iter_mut()
        .find(|f| f.discovered.id == hit.discovered.id)
    {
        Some(existing) => *existing = hit,
        None => found.push(hit),
    }
}
