//! Base64 wire payloads and peripheral handles exchanged with transports.

use std::fmt;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::error::DomainError;

/// A characteristic value in its base64 transport form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Payload(String);

impl Payload {
    /// Encode raw bytes.
    #[must_use]
    pub fn encode(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Wrap base64 text received from a transport without validating it.
    #[must_use]
    pub fn from_base64(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Decode back to raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::InvalidPayload`] if the text is not valid base64.
    pub fn decode(&self) -> Result<Vec<u8>, DomainError> {
        Ok(STANDARD.decode(&self.0)?)
    }

    /// Decode, treating malformed text as an empty reading.
    #[must_use]
    pub fn decode_lossy(&self) -> Vec<u8> {
        self.decode().unwrap_or_default()
    }

    #[must_use]
    pub fn as_base64(&self) -> &str {
        &self.0
    }
}

/// Transport-specific identifier of a discovered peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeripheralId(String);

impl PeripheralId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeripheralId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A peripheral reported by a scan, offered to the user for selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredPeripheral {
    pub id: PeripheralId,
    pub local_name: Option<String>,
    pub rssi: Option<i16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_encode_bytes_as_base64() {
        assert_eq!(Payload::encode(&[255, 0]).as_base64(), "/wA=");
    }

    #[test]
    fn should_decode_transport_text() {
        let payload = Payload::from_base64("CgI=");
        assert_eq!(payload.decode().unwrap(), vec![10, 2]);
    }

    #[test]
    fn should_reject_malformed_base64() {
        let payload = Payload::from_base64("not base64!");
        assert!(matches!(payload.decode(), Err(DomainError::InvalidPayload(_))));
        assert!(payload.decode_lossy().is_empty());
    }

    #[test]
    fn should_decode_empty_payload_to_no_bytes() {
        assert!(Payload::default().decode().unwrap().is_empty());
    }
}
