//! Device command handlers.

use tabled::Tabled;

use hartkey_core::{CloudCoordinator, DeviceState};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    class: String,
    #[tabled(rename = "Open")]
    can_open: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Last Open")]
    last_open: String,
    #[tabled(rename = "Method")]
    method: String,
}

impl From<&DeviceState> for DeviceRow {
    fn from(s: &DeviceState) -> Self {
        Self {
            id: s.device.id.to_string(),
            name: s.device.name.clone(),
            class: s.device.class.to_string(),
            can_open: output::yes_no(s.device.can_open),
            available: output::yes_no(s.available),
            last_open: s
                .last_event
                .as_ref()
                .map_or_else(|| "-".into(), |e| output::local_time(e.timestamp)),
            method: s
                .last_event
                .as_ref()
                .map_or_else(|| "-".into(), |e| e.method.to_string()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(coordinator: &CloudCoordinator, global: &GlobalOpts) -> Result<(), CliError> {
    util::sync_once(coordinator).await?;

    let states: Vec<DeviceState> = coordinator.current_snapshot().iter().cloned().collect();
    let out = output::render_list(
        global.format(),
        &states,
        |s| DeviceRow::from(s),
        |s| s.device.id.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
