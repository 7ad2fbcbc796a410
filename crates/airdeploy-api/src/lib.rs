// airdeploy-api: Async Rust client for the wireless controller management API

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::Client;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
