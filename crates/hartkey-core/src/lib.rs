//! Device synchronization layer between `hartkey-api` and its consumers.
//!
//! This crate owns the polling engine, domain model and device registry
//! for the hartkey workspace:
//!
//! - **[`Coordinator`]**: Drives the timer-based poll loop with a strict
//!   single-flight guarantee: manual refreshes issued during a cycle are
//!   coalesced into it. [`Coordinator::trigger_open`] relays open commands
//!   and schedules a follow-up refresh. Failures never escape the loop;
//!   each one becomes a [`SyncState::Failed`] plus a [`SyncUpdate`].
//!
//! - **[`Registry`]**: Lock-free snapshot storage on `arc_swap`. Every
//!   cycle swaps in a fully assembled [`RegistrySnapshot`] and reports a
//!   [`RegistryDiff`].
//!
//! - **[`AuthContext`]**: The shared bearer token plus its known-invalid
//!   flag. A rejected token stops all remote traffic until replaced.
//!
//! - **[`Gateway`]**: The seam to the remote service, implemented for
//!   [`hartkey_api::HartkeyClient`] and mockable in tests.
//!
//! - **Domain model** ([`model`]) and **entity descriptors** ([`entity`]).

pub mod auth;
pub mod backoff;
pub mod config;
pub mod convert;
pub mod coordinator;
pub mod entity;
pub mod error;
pub mod gateway;
pub mod model;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::AuthContext;
pub use config::SyncConfig;
pub use coordinator::{CloudCoordinator, Coordinator, SyncState, SyncUpdate};
pub use entity::{EntityDescriptor, EntityKind, describe_snapshot};
pub use error::{CoreError, ErrorKind};
pub use gateway::{Gateway, validate_token};
pub use store::{Registry, RegistryDiff, RegistrySnapshot};

pub use hartkey_api::HartkeyClient;

pub use model::{Device, DeviceClass, DeviceId, DeviceState, OpenEvent, OpenMethod};
