//! Entity descriptor listing.

use tabled::Tabled;

use hartkey_core::{CloudCoordinator, EntityDescriptor, describe_snapshot};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct EntityRow {
    #[tabled(rename = "Unique ID")]
    unique_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Available")]
    available: String,
    #[tabled(rename = "Value")]
    value: String,
}

impl From<&EntityDescriptor> for EntityRow {
    fn from(e: &EntityDescriptor) -> Self {
        Self {
            unique_id: e.unique_id.clone(),
            name: e.name.clone(),
            kind: e.kind.to_string(),
            icon: e.icon.into(),
            available: output::yes_no(e.available),
            value: e.value.clone().unwrap_or_else(|| "-".into()),
        }
    }
}

pub async fn handle(coordinator: &CloudCoordinator, global: &GlobalOpts) -> Result<(), CliError> {
    util::sync_once(coordinator).await?;

    let entities = describe_snapshot(&coordinator.current_snapshot());
    let out = output::render_list(
        global.format(),
        &entities,
        |e| EntityRow::from(e),
        |e| e.unique_id.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
