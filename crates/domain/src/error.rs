//! Domain error types.
//!
//! Codecs never fail on telemetry (malformed readings decode to a default),
//! so these only cover user-supplied command input and payload text.

/// Errors raised while building commands or decoding payload text.
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    /// An LED bitmap string has the wrong length or a cell other than `0`/`1`.
    #[error("invalid LED bitmap")]
    InvalidBitmap(#[source] BitmapError),

    /// A hex pattern is not exactly 16 hex digits.
    #[error("invalid hex pattern {0:?}")]
    InvalidHex(String),

    /// No glyph with the given name exists in the glyph library.
    #[error("unknown glyph {0:?}")]
    UnknownGlyph(String),

    /// No buzzer alert with the given name exists.
    #[error("unknown alert {0:?}")]
    UnknownAlert(String),

    /// A payload is not valid base64.
    #[error("invalid base64 payload")]
    InvalidPayload(#[from] base64::DecodeError),
}

/// Details about why an LED bitmap string was rejected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BitmapError {
    /// The string does not hold exactly 64 cells.
    #[error("bitmap must have 64 cells, got {actual}")]
    WrongLength {
        /// Number of characters received.
        actual: usize,
    },

    /// A cell is neither `'0'` nor `'1'`.
    #[error("invalid cell {found:?} at index {index}")]
    InvalidCell {
        /// Position of the offending character.
        index: usize,
        /// The offending character.
        found: char,
    },
}

impl From<BitmapError> for DomainError {
    fn from(err: BitmapError) -> Self {
        Self::InvalidBitmap(err)
    }
}
