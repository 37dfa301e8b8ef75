//! `ondus tree`: dashboard discovery rendered as a hierarchy.

use std::fmt::Write as _;

use serde::Serialize;

use ondus_api::Session;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::commands::list::ApplianceRow;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct LocationNode {
    id: i64,
    name: String,
    rooms: Vec<RoomNode>,
}

#[derive(Serialize)]
struct RoomNode {
    id: i64,
    name: String,
    appliances: Vec<ApplianceRow>,
}

pub async fn handle(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    session.discover().await;

    let mut tree = Vec::new();
    for location in session.locations().await {
        let mut rooms = Vec::new();
        for room in location.rooms().await {
            let appliances = room.appliances().await.iter().map(ApplianceRow::from).collect();
            rooms.push(RoomNode {
                id: room.id(),
                name: room.name(),
                appliances,
            });
        }
        tree.push(LocationNode {
            id: location.id(),
            name: location.name(),
            rooms,
        });
    }

    let out = match global.output {
        OutputFormat::Json => serde_json::to_string_pretty(&tree)?,
        OutputFormat::JsonCompact => serde_json::to_string(&tree)?,
        OutputFormat::Table | OutputFormat::Plain => render_text(&tree),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn render_text(tree: &[LocationNode]) -> String {
    if tree.is_empty() {
        return "No locations.".into();
    }

    let mut out = String::new();
    for location in tree {
        let _ = writeln!(out, "{} ({})", location.name, location.id);
        for room in &location.rooms {
            let _ = writeln!(out, "  {} ({})", room.name, room.id);
            for appliance in &room.appliances {
                let _ = writeln!(out, "    {} [{}] {}", appliance.name, appliance.kind, appliance.id);
            }
        }
    }
    out.trim_end().to_owned()
}
