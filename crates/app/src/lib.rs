//! # blockbot-app
//!
//! Application layer: the peripheral channel and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `Transport`: scan, connect, write, read against one peripheral
//!   - `TransportFactory`: a fresh transport per scan
//!   - `GroupKeySource`: the classroom group setting
//! - Provide the **driving side** used by block programs:
//!   - `PeripheralChannel`: connection lifecycle, busy-locked writes, cached telemetry
//!   - block facades (`MotorBlocks`, `LampBlocks`, …) and scripted duration runs
//! - Provide **in-process infrastructure** (channel event bus, telemetry poller)
//!   that doesn't need IO of its own
//!
//! ## Dependency rule
//! Depends on `blockbot-domain` only (plus `tokio` for tasks, timers and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod blocks;
pub mod channel;
pub mod error;
pub mod event_bus;
pub mod ports;
pub mod scripted;
mod telemetry;

#[cfg(test)]
mod testing;
