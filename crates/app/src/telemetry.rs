//! Fixed-interval sensor polling.
//!
//! One poller task runs per connected sensor device. Each tick reads every
//! probe in the device's [`TelemetryPlan`] and folds the decoded values into
//! the channel's cached snapshot. Failed reads keep the previous value.

use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use blockbot_domain::device::TelemetryPlan;

use crate::channel::Shared;
use crate::ports::Transport;

pub(crate) fn spawn_poller<T: Transport>(
    shared: Arc<Shared<T>>,
    plan: TelemetryPlan,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(plan.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let Some(transport) = shared.connected_transport() else {
                continue;
            };

            for (endpoint, probe) in &plan.probes {
                match transport.read(*endpoint).await {
                    Ok(payload) => {
                        let bytes = payload.decode_lossy();
                        tracing::trace!(?probe, len = bytes.len(), "sensor read");
                        shared.update_reading(|snapshot| {
                            snapshot.apply(*probe, &bytes, Utc::now());
                        });
                    }
                    Err(err) => tracing::debug!(%err, ?probe, "sensor read failed"),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use blockbot_domain::device::{DeviceKind, LIGHT, PROXIMITY, TOUCH};
    use blockbot_domain::filter::GroupKey;

    use crate::channel::PeripheralChannel;
    use crate::event_bus::ChannelEvent;
    use crate::testing::FakeFactory;

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    async fn connect(
        kind: DeviceKind,
        factory: &FakeFactory,
    ) -> PeripheralChannel<FakeFactory, Option<GroupKey>> {
        let channel = PeripheralChannel::new(kind, factory.clone(), None);
        let found = channel.scan().await.unwrap();
        channel.connect(&found[0].id).await.unwrap();
        settle().await;
        channel
    }

    #[tokio::test(start_paused = true)]
    async fn should_poll_light_and_touch_after_connect() {
        let factory = FakeFactory::default();
        factory.state.set_reading(LIGHT, &[10, 2]);
        factory.state.set_reading(TOUCH, &[1]);

        let channel = connect(DeviceKind::LightTouch, &factory).await;

        let snapshot = channel.last_reading();
        assert_eq!(snapshot.light.raw, 520);
        assert!(snapshot.touched.0);
        assert!(snapshot.updated_at.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn should_refresh_reading_on_next_interval() {
        let factory = FakeFactory::default();
        factory.state.set_reading(PROXIMITY, &[0]);
        let channel = connect(DeviceKind::Proximity, &factory).await;
        assert!(!channel.last_reading().near.0);

        factory.state.set_reading(PROXIMITY, &[1]);
        tokio::time::sleep(Duration::from_millis(199)).await;
        settle().await;
        assert!(!channel.last_reading().near.0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        settle().await;
        assert!(channel.last_reading().near.0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_keep_cached_value_when_read_fails() {
        let factory = FakeFactory::default();
        factory.state.set_reading(PROXIMITY, &[1]);
        let channel = connect(DeviceKind::Proximity, &factory).await;

        factory.state.clear_reading(PROXIMITY);
        tokio::time::sleep(Duration::from_millis(600)).await;
        settle().await;

        assert!(channel.last_reading().near.0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_polling_on_disconnect() {
        let factory = FakeFactory::default();
        factory.state.set_reading(PROXIMITY, &[1]);
        let channel = connect(DeviceKind::Proximity, &factory).await;
        channel.disconnect().await;
        let reads = factory.state.reads();

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(factory.state.reads(), reads);
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_poll_actuators() {
        let factory = FakeFactory::default();
        let _channel = connect(DeviceKind::RgbLamp, &factory).await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        settle().await;

        assert_eq!(factory.state.reads(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn should_reset_snapshot_on_reconnect() {
        let factory = FakeFactory::default();
        factory.state.set_reading(PROXIMITY, &[1]);
        let channel = connect(DeviceKind::Proximity, &factory).await;
        assert!(channel.last_reading().near.0);

        factory.state.clear_reading(PROXIMITY);
        let found = channel.scan().await.unwrap();
        channel.connect(&found[0].id).await.unwrap();
        settle().await;

        assert!(!channel.last_reading().near.0);
        assert!(channel.last_reading().updated_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn should_publish_reading_events() {
        let factory = FakeFactory::default();
        factory.state.set_reading(PROXIMITY, &[1]);
        let channel =
            PeripheralChannel::new(DeviceKind::Proximity, factory.clone(), None::<GroupKey>);
        let mut events = channel.events().subscribe();
        let found = channel.scan().await.unwrap();
        channel.connect(&found[0].id).await.unwrap();
        settle().await;

        assert!(matches!(events.recv().await.unwrap(), ChannelEvent::Discovered(_)));
        assert!(matches!(events.recv().await.unwrap(), ChannelEvent::Connected(_)));
        let ChannelEvent::Reading(snapshot) = events.recv().await.unwrap() else {
            panic!("expected a reading event");
        };
        assert!(snapshot.near.0);
    }
}
