//! 8×8 LED matrix codec.
//!
//! The wire format is one byte per row, row 0 first. Within a row the
//! bitmap text is read left to right but the firmware expects column 0 in
//! the least significant bit, so each 8-cell row string is reversed before
//! being parsed as base 2.

use std::fmt;
use std::str::FromStr;

use crate::error::{BitmapError, DomainError};

use super::glyphs;

/// Number of rows (and columns) on the matrix.
pub const SIZE: usize = 8;

/// Number of cells on the matrix.
pub const CELLS: usize = SIZE * SIZE;

/// A row-major 8×8 on/off bitmap.
///
/// Stored as the wire rows directly: `rows[r]` bit `c` is the cell at row
/// `r`, column `c`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LedBitmap {
    rows: [u8; SIZE],
}

impl LedBitmap {
    /// The all-off bitmap sent by the "clear" block.
    pub const CLEAR: Self = Self { rows: [0; SIZE] };

    /// Parse a 64-character `'0'`/`'1'` string in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`BitmapError`] when the string is not exactly 64 cells or
    /// contains a character other than `'0'` or `'1'`.
    pub fn parse(text: &str) -> Result<Self, BitmapError> {
        let cells: Vec<char> = text.chars().collect();
        if cells.len() != CELLS {
            return Err(BitmapError::WrongLength {
                actual: cells.len(),
            });
        }

        if let Some((index, found)) = cells
            .iter()
            .enumerate()
            .find(|(_, c)| **c != '0' && **c != '1')
        {
            return Err(BitmapError::InvalidCell {
                index,
                found: *found,
            });
        }

        let mut rows = [0u8; SIZE];
        for (row, chunk) in cells.chunks(SIZE).enumerate() {
            let reversed: String = chunk.iter().rev().collect();
            rows[row] = u8::from_str_radix(&reversed, 2).map_err(|_| BitmapError::InvalidCell {
                index: row * SIZE,
                found: chunk[0],
            })?;
        }
        Ok(Self { rows })
    }

    /// Build a bitmap from its 16-character hex form.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidHex`] unless `hex` is exactly 16 hex digits.
    pub fn from_hex(hex: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidHex(hex.to_string());
        if hex.len() != SIZE * 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let mut rows = [0u8; SIZE];
        for (row, slot) in rows.iter_mut().enumerate() {
            *slot = u8::from_str_radix(&hex[row * 2..row * 2 + 2], 16).map_err(|_| invalid())?;
        }
        Ok(Self { rows })
    }

    /// Look up a canned pattern from the glyph library.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownGlyph`] when no glyph has that name.
    pub fn glyph(name: &str) -> Result<Self, DomainError> {
        let hex = glyphs::find(name).ok_or_else(|| DomainError::UnknownGlyph(name.to_string()))?;
        Self::from_hex(hex)
    }

    /// Build a bitmap from the 8 wire bytes.
    #[must_use]
    pub fn from_bytes(rows: [u8; SIZE]) -> Self {
        Self { rows }
    }

    /// Decode a wire payload; anything but 8 bytes is rejected.
    #[must_use]
    pub fn from_payload(bytes: &[u8]) -> Option<Self> {
        let rows: [u8; SIZE] = bytes.try_into().ok()?;
        Some(Self { rows })
    }

    /// Uppercase, zero-padded hex, two digits per row.
    #[must_use]
    pub fn to_hex(&self) -> String {
        self.rows.iter().map(|row| format!("{row:02X}")).collect()
    }

    /// The 8 bytes written to the matrix characteristic.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; SIZE] {
        self.rows
    }

    /// Whether the cell at (`row`, `col`) is lit. Out-of-range cells are off.
    #[must_use]
    pub fn is_lit(&self, row: usize, col: usize) -> bool {
        row < SIZE && col < SIZE && self.rows[row] & (1 << col) != 0
    }
}

impl fmt::Display for LedBitmap {
    /// Writes the 64-character `'0'`/`'1'` row-major text form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..SIZE {
            for col in 0..SIZE {
                f.write_str(if self.is_lit(row, col) { "1" } else { "0" })?;
            }
        }
        Ok(())
    }
}

impl FromStr for LedBitmap {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s)?)
    }
}
