//! Per-device wire codecs.
//!
//! Every codec is a pure mapping between a semantic command or reading and
//! the raw bytes exchanged with the peripheral.

pub mod buzzer;
pub mod glyphs;
pub mod lamp;
pub mod matrix;
pub mod motor;
pub mod sensor;

use buzzer::Note;
use lamp::Rgb;
use matrix::LedBitmap;
use motor::MotorDirection;

/// A command for any writable device kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Motor(MotorDirection),
    Lamp(Rgb),
    Matrix(LedBitmap),
    Buzzer(Note),
}

impl Command {
    /// Raw bytes written to the device's command characteristic.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Self::Motor(direction) => direction.to_bytes().to_vec(),
            Self::Lamp(rgb) => rgb.to_bytes().to_vec(),
            Self::Matrix(bitmap) => bitmap.to_bytes().to_vec(),
            Self::Buzzer(note) => note.to_bytes().to_vec(),
        }
    }
}
