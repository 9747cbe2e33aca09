//! RGB lamp codec.

use serde::{Deserialize, Serialize};

/// A lamp colour, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// The colour sent by the "lamp off" block.
    pub const OFF: Self = Self::new(0, 0, 0);

    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Build a colour from block inputs, clamping each channel to `0..=255`.
    #[must_use]
    pub fn clamped(r: i64, g: i64, b: i64) -> Self {
        let channel = |v: i64| u8::try_from(v.clamp(0, 255)).unwrap_or(u8::MAX);
        Self::new(channel(r), channel(g), channel(b))
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}
