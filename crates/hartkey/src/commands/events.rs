//! Event command handlers.

use tabled::Tabled;

use hartkey_core::{CloudCoordinator, OpenEvent};

use crate::cli::{EventsArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Event")]
    event_type: String,
}

impl From<&OpenEvent> for EventRow {
    fn from(e: &OpenEvent) -> Self {
        Self {
            time: output::local_time(e.timestamp),
            method: e.method.to_string(),
            event_type: e.event_type.clone(),
        }
    }
}

pub async fn handle(
    coordinator: &CloudCoordinator,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    util::sync_once(coordinator).await?;
    let device_id = util::resolve_device_id(&coordinator.current_snapshot(), &args.device)?;

    let events = coordinator.recent_events(&device_id, args.limit).await?;
    let out = output::render_list(
        global.format(),
        &events,
        |e| EventRow::from(e),
        |e| e.timestamp.to_rfc3339(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
