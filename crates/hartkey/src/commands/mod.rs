//! Command dispatch: bridges CLI args -> coordinator calls -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod entities;
pub mod events;
pub mod open;
pub mod util;
pub mod watch;

use hartkey_core::CloudCoordinator;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a coordinator-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    coordinator: &CloudCoordinator,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Devices => devices::handle(coordinator, global).await,
        Command::Events(args) => events::handle(coordinator, args, global).await,
        Command::Open(args) => open::handle(coordinator, args, global).await,
        Command::Watch => watch::handle(coordinator, global).await,
        Command::Entities => entities::handle(coordinator, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
