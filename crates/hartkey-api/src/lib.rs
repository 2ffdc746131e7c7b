// hartkey-api: Async Rust client for the Hartkey intercom cloud API

pub mod client;
pub mod error;
pub mod models;
pub mod transport;

pub use client::{Endpoints, HartkeyClient, MAX_EVENT_PAGE};
pub use error::Error;
pub use models::{RawDevice, RawEvent};
pub use transport::TransportConfig;
