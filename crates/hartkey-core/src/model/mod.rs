// Domain model for Hartkey devices and their open history.
//
// These types are the canonical representation consumed by the CLI and
// any other frontend. They are produced from wire types in `convert.rs`
// and never carry transport details.

pub mod device;
pub mod event;
pub mod state;

pub use device::{Device, DeviceClass, DeviceId};
pub use event::{OpenEvent, OpenMethod, latest_event, newer_event};
pub use state::DeviceState;
