//! `watch`: run the sync loop in the foreground and print each update.

use std::fmt::Write as _;

use chrono::{DateTime, Local};
use owo_colors::OwoColorize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use hartkey_core::{CloudCoordinator, SyncUpdate};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

pub async fn handle(coordinator: &CloudCoordinator, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(global.color);
    let format = global.format();

    // Subscribe before starting so the first cycle is not missed.
    let mut updates = coordinator.subscribe();
    coordinator.start().await?;
    info!(
        interval_minutes = coordinator.config().interval_minutes(),
        "watching for updates, Ctrl-C to stop"
    );

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            biased;
            signal = &mut ctrl_c => break signal.map_err(CliError::from),
            received = updates.recv() => match received {
                Ok(update) => {
                    let out = render_update(&update, format, color);
                    output::print_output(&out, global.quiet);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind, some updates were dropped");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    coordinator.shutdown().await;
    result
}

fn render_update(update: &SyncUpdate, format: OutputFormat, color: bool) -> String {
    match format {
        OutputFormat::Table => describe_update(update, color),
        OutputFormat::Json | OutputFormat::JsonCompact => output::render_json_compact(update),
        OutputFormat::Yaml => format!("---\n{}", output::render_yaml(update)),
        OutputFormat::Plain => match (update.error, update.degraded) {
            (Some(kind), _) => kind.to_string(),
            (None, Some(kind)) => format!("degraded ({kind})"),
            (None, None) => "success".into(),
        },
    }
}

/// One header line per cycle, then one line per changed device.
fn describe_update(update: &SyncUpdate, color: bool) -> String {
    let time = update
        .completed_at
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string();

    let status = match (update.error, update.degraded) {
        (None, None) if color => "ok".green().to_string(),
        (None, None) => "ok".to_string(),
        (None, Some(kind)) if color => format!("degraded ({kind})").yellow().to_string(),
        (None, Some(kind)) => format!("degraded ({kind})"),
        (Some(kind), _) if color => format!("failed ({kind})").red().to_string(),
        (Some(kind), _) => format!("failed ({kind})"),
    };

    let mut out = format!(
        "{time} {status}  +{} ~{} -{}",
        update.added.len(),
        update.updated.len(),
        update.removed.len()
    );
    if update.unavailable {
        out.push_str("  all devices unavailable");
    }

    for device in &update.added {
        let _ = write!(out, "\n  + {} ({})", device.name, device.id);
    }
    for state in &update.updated {
        let detail = match (&state.last_event, state.available) {
            (_, false) => "unavailable".to_string(),
            (Some(event), true) => format!(
                "last open {} via {}",
                local_clock(event.timestamp),
                event.method
            ),
            (None, true) => "no recent opens".to_string(),
        };
        let _ = write!(out, "\n  ~ {}: {detail}", state.device.name);
    }
    for id in &update.removed {
        let _ = write!(out, "\n  - {id}");
    }
    out
}

fn local_clock(ts: DateTime<chrono::Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}
