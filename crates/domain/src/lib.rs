//! # blockbot-domain
//!
//! Pure domain model for driving BLE classroom peripherals from block
//! programs.
//!
//! ## Responsibilities
//! - Device kinds, their advertised names and fixed GATT endpoints
//! - Discovery filters qualified by a classroom group key
//! - Wire codecs: motor direction, RGB lamp, 8×8 LED matrix, buzzer notes,
//!   light and boolean sensor readings
//! - Base64 payloads as exchanged with transports
//!
//! ## Dependency rule
//! This crate has **no internal dependencies** and performs no IO.
//! IO boundaries are traits in the `app` crate (ports).

pub mod codec;
pub mod device;
pub mod error;
pub mod filter;
pub mod payload;

pub use codec::sensor;
