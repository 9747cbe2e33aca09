//! Duration blocks: timed command sequences owned by the caller.
//!
//! The channel has no notion of time beyond its busy deadline. A
//! [`ScriptedRun`] sequences plain sends on a background task and completes
//! once the block's settle delay has elapsed.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use blockbot_domain::codec::Command;
use blockbot_domain::codec::buzzer::Note;
use blockbot_domain::codec::motor::MotorDirection;

use crate::blocks::BlockChannel;

/// Longest motor run a block may request.
pub const MAX_RUN: Duration = Duration::from_secs(360);

/// Delay between the motor stop command and block completion.
pub const STOP_SETTLE: Duration = Duration::from_millis(500);

/// How often a held note is re-sent.
pub const NOTE_RETRIGGER: Duration = Duration::from_millis(50);

/// Delay between the last note and block completion.
pub const NOTE_SETTLE: Duration = Duration::from_millis(100);

/// Upper bound on a note's length in beats. One beat lasts one second.
pub const MAX_BEATS: f64 = 100.0;

type OnCancel = Box<dyn Fn() + Send + Sync>;

/// Handle to a running duration block.
pub struct ScriptedRun {
    handle: JoinHandle<()>,
    /// Sent when a run is cancelled before it completes.
    on_cancel: Option<OnCancel>,
}

impl fmt::Debug for ScriptedRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedRun")
            .field("finished", &self.handle.is_finished())
            .field("stops_on_cancel", &self.on_cancel.is_some())
            .finish()
    }
}

impl ScriptedRun {
    /// Wait until the block completes (or was cancelled).
    pub async fn finished(self) {
        if let Err(err) = self.handle.await {
            if err.is_panic() {
                tracing::error!(%err, "scripted run panicked");
            }
        }
    }

    /// Abort the remaining steps.
    ///
    /// A cancelled motor run sends `Stop` straight away; the stop goes
    /// through the busy lock like any send, so it is dropped if the start
    /// command is still in flight. A cancelled note simply stops re-sending.
    /// Cancelling a finished run does nothing.
    pub fn cancel(&self) {
        if self.handle.is_finished() {
            return;
        }
        self.handle.abort();
        if let Some(on_cancel) = &self.on_cancel {
            on_cancel();
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn clamp_secs(secs: f64, max: f64) -> Duration {
    if secs.is_nan() {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(secs.clamp(0.0, max))
}

/// Run duration for a motor block, clamped to `[0, MAX_RUN]`.
#[must_use]
pub fn run_duration(secs: f64) -> Duration {
    clamp_secs(secs, MAX_RUN.as_secs_f64())
}

/// Hold duration for a note block, clamped to `[0, MAX_BEATS]` beats.
#[must_use]
pub fn note_duration(beats: f64) -> Duration {
    clamp_secs(beats, MAX_BEATS)
}

/// Turn the motor now, stop it after `secs`, complete [`STOP_SETTLE`] later.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn run_motor_for<C: BlockChannel>(
    channel: Arc<C>,
    direction: MotorDirection,
    secs: f64,
) -> ScriptedRun {
    let duration = run_duration(secs);
    tracing::debug!(?direction, duration_ms = duration.as_millis(), "motor run started");
    channel.send_command(&Command::Motor(direction));

    let stopper = Arc::clone(&channel);
    let handle = tokio::spawn(async move {
        tokio::time::sleep(duration).await;
        channel.send_command(&Command::Motor(MotorDirection::Stop));
        tokio::time::sleep(STOP_SETTLE).await;
    });
    ScriptedRun {
        handle,
        on_cancel: Some(Box::new(move || {
            tracing::debug!("motor run cancelled, stopping");
            stopper.send_command(&Command::Motor(MotorDirection::Stop));
        })),
    }
}

/// Re-send `note` every [`NOTE_RETRIGGER`] for `beats` seconds, complete
/// [`NOTE_SETTLE`] after the last beat.
///
/// # Panics
///
/// Panics if called outside a tokio runtime.
pub fn play_note_for<C: BlockChannel>(channel: Arc<C>, note: Note, beats: f64) -> ScriptedRun {
    let duration = note_duration(beats);
    tracing::debug!(command = note.command, duration_ms = duration.as_millis(), "note started");

    let handle = tokio::spawn(async move {
        let end = Instant::now() + duration;
        let mut ticker = tokio::time::interval(NOTE_RETRIGGER);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            let tick = ticker.tick().await;
            if tick >= end {
                break;
            }
            channel.send_command(&Command::Buzzer(note));
        }
        tokio::time::sleep_until(end + NOTE_SETTLE).await;
    });
    ScriptedRun {
        handle,
        on_cancel: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChannel;

    #[test]
    fn should_clamp_run_duration() {
        assert_eq!(run_duration(2.0), Duration::from_secs(2));
        assert_eq!(run_duration(-1.0), Duration::ZERO);
        assert_eq!(run_duration(1_000.0), MAX_RUN);
        assert_eq!(run_duration(f64::INFINITY), MAX_RUN);
        assert_eq!(run_duration(f64::NAN), Duration::ZERO);
    }

    #[test]
    fn should_clamp_note_duration() {
        assert_eq!(note_duration(0.5), Duration::from_millis(500));
        assert_eq!(note_duration(250.0), Duration::from_secs(100));
        assert_eq!(note_duration(-3.0), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_motor_after_duration_and_settle() {
        let channel = Arc::new(RecordingChannel::default());
        let start = Instant::now();

        let run = run_motor_for(Arc::clone(&channel), MotorDirection::Right, 2.0);
        run.finished().await;

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].bytes, vec![0, 255]);
        assert_eq!(sent[0].at - start, Duration::ZERO);
        assert_eq!(sent[1].bytes, vec![0, 0]);
        assert_eq!(sent[1].at - start, Duration::from_millis(2000));
        assert_eq!(Instant::now() - start, Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn should_cap_motor_run_at_six_minutes() {
        let channel = Arc::new(RecordingChannel::default());
        let start = Instant::now();

        run_motor_for(Arc::clone(&channel), MotorDirection::Left, 10_000.0)
            .finished()
            .await;

        assert_eq!(channel.sent()[1].at - start, MAX_RUN);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_motor_immediately_when_cancelled() {
        let channel = Arc::new(RecordingChannel::default());
        let start = Instant::now();

        let run = run_motor_for(Arc::clone(&channel), MotorDirection::Left, 5.0);
        tokio::time::sleep(Duration::from_secs(1)).await;
        run.cancel();
        tokio::time::sleep(Duration::from_secs(10)).await;

        let sent = channel.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1].bytes, vec![0, 0]);
        assert_eq!(sent[1].at - start, Duration::from_secs(1));
        run.finished().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_send_nothing_when_cancelling_finished_run() {
        let channel = Arc::new(RecordingChannel::default());

        let run = run_motor_for(Arc::clone(&channel), MotorDirection::Right, 1.0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(run.is_finished());
        run.cancel();

        assert_eq!(channel.sent().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn should_stop_retriggering_note_when_cancelled() {
        let channel = Arc::new(RecordingChannel::default());

        let run = play_note_for(Arc::clone(&channel), Note::from_name("C4"), 2.0);
        tokio::time::sleep(Duration::from_millis(120)).await;
        run.cancel();
        let sent = channel.sent().len();
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(channel.sent().len(), sent);
    }

    #[tokio::test(start_paused = true)]
    async fn should_retrigger_note_every_fifty_millis() {
        let channel = Arc::new(RecordingChannel::default());
        let start = Instant::now();
        let note = Note::from_name("C4");

        play_note_for(Arc::clone(&channel), note, 2.0).finished().await;

        let sent = channel.sent();
        assert_eq!(sent.len(), 40);
        assert!(sent.iter().all(|s| s.bytes == vec![note.command]));
        assert_eq!(sent[1].at - sent[0].at, NOTE_RETRIGGER);
        assert!(sent.last().unwrap().at - start < Duration::from_secs(2));
        assert_eq!(Instant::now() - start, Duration::from_millis(2100));
    }

    #[tokio::test(start_paused = true)]
    async fn should_complete_zero_beat_note_without_sending() {
        let channel = Arc::new(RecordingChannel::default());
        let start = Instant::now();

        play_note_for(Arc::clone(&channel), Note::from_name("C4"), 0.0)
            .finished()
            .await;

        assert!(channel.sent().is_empty());
        assert_eq!(Instant::now() - start, NOTE_SETTLE);
    }
}
