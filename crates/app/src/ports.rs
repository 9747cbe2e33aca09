//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the channel and the outside world: the
//! BLE stack (or a simulator) behind [`Transport`], and the per-session
//! group setting behind [`GroupKeySource`].

pub mod settings;
pub mod transport;

pub use settings::GroupKeySource;
pub use transport::{Transport, TransportFactory, WriteMode};
