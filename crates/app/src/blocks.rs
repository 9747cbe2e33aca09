//! Block facades: the calls a visual block program makes, one facade per
//! device kind.
//!
//! Facades translate block inputs into codec commands and sensor accessors.
//! Command blocks never fail on delivery: a send that the channel drops
//! (busy, disconnected) is simply lost, as the block runtime expects. Only
//! malformed block input (bad bitmap text, unknown glyph or alert) is
//! reported back.

use std::sync::Arc;

use blockbot_domain::codec::Command;
use blockbot_domain::codec::buzzer::Note;
use blockbot_domain::codec::lamp::Rgb;
use blockbot_domain::codec::matrix::LedBitmap;
use blockbot_domain::codec::motor::MotorDirection;
use blockbot_domain::error::DomainError;
use blockbot_domain::sensor::SensorSnapshot;

use crate::channel::{PeripheralChannel, SendOutcome};
use crate::ports::{GroupKeySource, TransportFactory};
use crate::scripted::{self, ScriptedRun};

/// What a facade needs from a channel.
pub trait BlockChannel: Send + Sync + 'static {
    fn send_command(&self, command: &Command) -> SendOutcome;

    fn last_reading(&self) -> SensorSnapshot;
}

impl<F: TransportFactory, K: GroupKeySource> BlockChannel for PeripheralChannel<F, K> {
    fn send_command(&self, command: &Command) -> SendOutcome {
        PeripheralChannel::send_command(self, command)
    }

    fn last_reading(&self) -> SensorSnapshot {
        PeripheralChannel::last_reading(self)
    }
}

/// Blocks for either DC motor.
pub struct MotorBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> MotorBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    pub fn turn(&self, direction: MotorDirection) -> SendOutcome {
        self.channel.send_command(&Command::Motor(direction))
    }

    /// Turn using a raw menu value; unrecognised values stop the motor.
    pub fn turn_menu(&self, value: &str) -> SendOutcome {
        self.turn(MotorDirection::from_menu(value))
    }

    pub fn stop(&self) -> SendOutcome {
        self.turn(MotorDirection::Stop)
    }

    /// "Run motor for N seconds".
    pub fn run_for(&self, direction: MotorDirection, secs: f64) -> ScriptedRun {
        scripted::run_motor_for(Arc::clone(&self.channel), direction, secs)
    }
}

/// Blocks for the RGB lamp.
pub struct LampBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> LampBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    /// Set the colour from block number inputs, clamped to `0..=255`.
    pub fn set(&self, r: i64, g: i64, b: i64) -> SendOutcome {
        self.set_rgb(Rgb::clamped(r, g, b))
    }

    pub fn set_rgb(&self, rgb: Rgb) -> SendOutcome {
        self.channel.send_command(&Command::Lamp(rgb))
    }

    pub fn off(&self) -> SendOutcome {
        self.set_rgb(Rgb::OFF)
    }
}

/// Blocks for the 8×8 LED matrix.
pub struct MatrixBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> MatrixBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    /// Show a 64-cell `'0'`/`'1'` drawing from the matrix editor.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidBitmap`]; nothing is sent in that case.
    pub fn show(&self, bits: &str) -> Result<SendOutcome, DomainError> {
        let bitmap: LedBitmap = bits.parse()?;
        Ok(self.show_bitmap(bitmap))
    }

    /// Show a named pattern from the glyph library.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownGlyph`]; nothing is sent in that case.
    pub fn show_glyph(&self, name: &str) -> Result<SendOutcome, DomainError> {
        Ok(self.show_bitmap(LedBitmap::glyph(name)?))
    }

    /// Show a 16-digit hex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidHex`]; nothing is sent in that case.
    pub fn show_hex(&self, hex: &str) -> Result<SendOutcome, DomainError> {
        Ok(self.show_bitmap(LedBitmap::from_hex(hex)?))
    }

    pub fn show_bitmap(&self, bitmap: LedBitmap) -> SendOutcome {
        self.channel.send_command(&Command::Matrix(bitmap))
    }

    pub fn clear(&self) -> SendOutcome {
        self.show_bitmap(LedBitmap::CLEAR)
    }
}

/// Blocks for the piezo buzzer.
pub struct BuzzerBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> BuzzerBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    /// Play a note once. Unknown names play the fallback pitch.
    pub fn play(&self, name: &str) -> SendOutcome {
        self.channel
            .send_command(&Command::Buzzer(Note::from_name(name)))
    }

    /// "Play note for B beats".
    pub fn play_for(&self, name: &str, beats: f64) -> ScriptedRun {
        scripted::play_note_for(Arc::clone(&self.channel), Note::from_name(name), beats)
    }

    /// Play one of the canned alert sounds.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownAlert`]; nothing is sent in that case.
    pub fn alert(&self, name: &str) -> Result<SendOutcome, DomainError> {
        let note = Note::alert(name).ok_or_else(|| DomainError::UnknownAlert(name.to_string()))?;
        Ok(self.channel.send_command(&Command::Buzzer(note)))
    }
}

/// Reporter blocks for the light/touch sensor.
pub struct LightTouchBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> LightTouchBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    #[must_use]
    pub fn light(&self) -> u16 {
        self.channel.last_reading().light.raw
    }

    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.channel.last_reading().touched.0
    }
}

/// Reporter block for the proximity sensor.
pub struct ProximityBlocks<C> {
    channel: Arc<C>,
}

impl<C: BlockChannel> ProximityBlocks<C> {
    pub fn new(channel: Arc<C>) -> Self {
        Self { channel }
    }

    #[must_use]
    pub fn is_near(&self) -> bool {
        self.channel.last_reading().near.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingChannel;
    use blockbot_domain::error::BitmapError;
    use blockbot_domain::sensor::{BoolReading, LightReading};

    fn recording() -> Arc<RecordingChannel> {
        Arc::new(RecordingChannel::default())
    }

    fn last_bytes(channel: &RecordingChannel) -> Vec<u8> {
        channel.sent().last().unwrap().bytes.clone()
    }

    #[test]
    fn should_send_motor_directions() {
        let channel = recording();
        let motor = MotorBlocks::new(Arc::clone(&channel));

        motor.turn(MotorDirection::Left);
        assert_eq!(last_bytes(&channel), vec![255, 0]);
        motor.turn_menu("right");
        assert_eq!(last_bytes(&channel), vec![0, 255]);
        motor.turn_menu("sideways");
        assert_eq!(last_bytes(&channel), vec![0, 0]);
        motor.stop();
        assert_eq!(last_bytes(&channel), vec![0, 0]);
    }

    #[test]
    fn should_clamp_lamp_inputs() {
        let channel = recording();
        let lamp = LampBlocks::new(Arc::clone(&channel));

        lamp.set(300, -5, 128);
        assert_eq!(last_bytes(&channel), vec![255, 0, 128]);
        lamp.off();
        assert_eq!(last_bytes(&channel), vec![0, 0, 0]);
    }

    #[test]
    fn should_send_matrix_bitmap_rows() {
        let channel = recording();
        let matrix = MatrixBlocks::new(Arc::clone(&channel));
        let mut bits = "0".repeat(64);
        bits.replace_range(0..1, "1");

        matrix.show(&bits).unwrap();

        assert_eq!(last_bytes(&channel), vec![1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn should_not_send_invalid_bitmap() {
        let channel = recording();
        let matrix = MatrixBlocks::new(Arc::clone(&channel));

        let err = matrix.show("0101").unwrap_err();

        assert!(matches!(
            err,
            DomainError::InvalidBitmap(BitmapError::WrongLength { actual: 4 })
        ));
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn should_send_glyph_and_clear() {
        let channel = recording();
        let matrix = MatrixBlocks::new(Arc::clone(&channel));

        matrix.show_glyph("heart").unwrap();
        assert_eq!(
            last_bytes(&channel),
            vec![0x00, 0x36, 0xFF, 0xFF, 0x7E, 0x3C, 0x18, 0x00]
        );
        matrix.clear();
        assert_eq!(last_bytes(&channel), vec![0; 8]);
        assert!(matrix.show_glyph("unicorn").is_err());
        assert_eq!(channel.sent().len(), 2);
    }

    #[test]
    fn should_send_hex_pattern() {
        let channel = recording();
        let matrix = MatrixBlocks::new(Arc::clone(&channel));

        matrix.show_hex("0102800F00FFF055").unwrap();

        assert_eq!(
            last_bytes(&channel),
            vec![0x01, 0x02, 0x80, 0x0F, 0x00, 0xFF, 0xF0, 0x55]
        );
    }

    #[test]
    fn should_play_note_with_fallback() {
        let channel = recording();
        let buzzer = BuzzerBlocks::new(Arc::clone(&channel));

        buzzer.play("도 C(60)");
        assert_eq!(last_bytes(&channel), vec![13]);
        buzzer.play("not a note");
        assert_eq!(
            last_bytes(&channel),
            vec![blockbot_domain::codec::buzzer::FALLBACK_COMMAND]
        );
    }

    #[test]
    fn should_play_alert_or_report_unknown() {
        let channel = recording();
        let buzzer = BuzzerBlocks::new(Arc::clone(&channel));

        buzzer.alert("beep").unwrap();
        assert_eq!(last_bytes(&channel), vec![101]);
        assert!(matches!(
            buzzer.alert("siren"),
            Err(DomainError::UnknownAlert(_))
        ));
        assert_eq!(channel.sent().len(), 1);
    }

    #[test]
    fn should_report_cached_sensor_values() {
        let channel = recording();
        channel.set_snapshot(SensorSnapshot {
            light: LightReading { raw: 520 },
            touched: BoolReading(true),
            near: BoolReading(true),
            updated_at: None,
        });

        let light_touch = LightTouchBlocks::new(Arc::clone(&channel));
        let proximity = ProximityBlocks::new(Arc::clone(&channel));

        assert_eq!(light_touch.light(), 520);
        assert!(light_touch.is_touched());
        assert!(proximity.is_near());
    }

    #[test]
    fn should_report_zero_values_before_first_poll() {
        let channel = recording();
        let light_touch = LightTouchBlocks::new(Arc::clone(&channel));
        assert_eq!(light_touch.light(), 0);
        assert!(!light_touch.is_touched());
    }
}
