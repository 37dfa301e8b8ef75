//! Flat listings built on the session's lazy traversals.

use futures_util::StreamExt;
use serde::Serialize;
use tabled::Tabled;

use ondus_api::{Appliance, ApplianceType, Location, Room, Session};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled, Serialize)]
pub(crate) struct LocationRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
}

impl From<&Location> for LocationRow {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id(),
            name: location.name(),
        }
    }
}

#[derive(Tabled, Serialize)]
pub(crate) struct RoomRow {
    #[tabled(rename = "Location")]
    pub location_id: i64,
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Role")]
    pub role: String,
}

impl From<&Room> for RoomRow {
    fn from(room: &Room) -> Self {
        Self {
            location_id: room.location_id(),
            id: room.id(),
            name: room.name(),
            role: room.role(),
        }
    }
}

#[derive(Tabled, Serialize)]
pub(crate) struct ApplianceRow {
    #[tabled(rename = "Location")]
    pub location_id: i64,
    #[tabled(rename = "Room")]
    pub room_id: i64,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub kind: ApplianceType,
}

impl From<&Appliance> for ApplianceRow {
    fn from(appliance: &Appliance) -> Self {
        let core = appliance.core();
        Self {
            location_id: core.location_id(),
            room_id: core.room_id(),
            id: core.id(),
            name: core.name(),
            kind: core.appliance_type(),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn locations(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<LocationRow> = session.locations().await.iter().map(LocationRow::from).collect();
    let out = output::render_list(&global.output, &rows, |r| r.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn rooms(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<RoomRow> = session.rooms().map(|r| RoomRow::from(&r)).collect().await;
    let out = output::render_list(&global.output, &rows, |r| r.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn appliances(session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let rows: Vec<ApplianceRow> = session
        .appliances()
        .map(|a| ApplianceRow::from(&a))
        .collect()
        .await;
    let out = output::render_list(&global.output, &rows, |r| r.id.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
