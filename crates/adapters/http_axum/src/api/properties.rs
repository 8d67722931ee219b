//! Facility endpoints: properties, their rooms and the machines in them.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::{MachineId, PropertyId, RoomId};
use pmtrack_domain::machine::{Machine, MachinePatch, MachineStatus, MachineType};
use pmtrack_domain::property::{Property, PropertyPatch};
use pmtrack_domain::room::{Room, RoomPatch};
use pmtrack_domain::time::Timestamp;

use super::{Created, NoContent, parse_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

/// `?is_active=` filter shared by the soft-deletable listings.
#[derive(Debug, Default, Deserialize)]
pub struct ActiveQuery {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePropertyRequest {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
    #[serde(default)]
    pub room_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateMachineRequest {
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub machine_type: MachineType,
    #[serde(default)]
    pub status: MachineStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub installation_date: Option<Timestamp>,
    #[serde(default)]
    pub warranty_expiry: Option<Timestamp>,
    #[serde(default)]
    pub last_maintenance: Option<Timestamp>,
    #[serde(default)]
    pub next_maintenance: Option<Timestamp>,
}

fn property_id(raw: &str) -> Result<PropertyId, ApiError> {
    parse_id("property", raw)
}

fn room_id(raw: &str) -> Result<RoomId, ApiError> {
    parse_id("room", raw)
}

/// `GET /api/v1/properties`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Property>>, ApiError> {
    let properties = state
        .facilities
        .list_properties(&user.actor(), query.is_active)
        .await?;
    Ok(Json(properties))
}

/// `POST /api/v1/properties`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreatePropertyRequest>,
) -> Result<Created<Property>, ApiError> {
    let property = Property::builder()
        .name(req.name)
        .address(req.address)
        .build()?;
    let created = state
        .facilities
        .create_property(&user.actor(), property)
        .await?;
    Ok(Created(created))
}

/// `GET /api/v1/properties/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Property>, ApiError> {
    let id = property_id(&id)?;
    Ok(Json(state.facilities.get_property(&user.actor(), id).await?))
}

/// `PUT /api/v1/properties/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> Result<Json<Property>, ApiError> {
    let id = property_id(&id)?;
    let updated = state
        .facilities
        .update_property(&user.actor(), id, patch)
        .await?;
    Ok(Json(updated))
}

/// `DELETE /api/v1/properties/{id}`
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    let id = property_id(&id)?;
    state.facilities.delete_property(&user.actor(), id).await?;
    Ok(NoContent)
}

/// `GET /api/v1/properties/{id}/rooms`
pub async fn list_rooms<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Room>>, ApiError> {
    let id = property_id(&id)?;
    let rooms = state
        .facilities
        .list_rooms(&user.actor(), id, query.is_active)
        .await?;
    Ok(Json(rooms))
}

/// `POST /api/v1/properties/{id}/rooms`
pub async fn create_room<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Created<Room>, ApiError> {
    let room = Room::builder()
        .property_id(property_id(&id)?)
        .name(req.name)
        .room_number(req.room_number)
        .build()?;
    Ok(Created(
        state.facilities.create_room(&user.actor(), room).await?,
    ))
}

/// `GET /api/v1/properties/{id}/rooms/{room_id}`
pub async fn get_room<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room)): Path<(String, String)>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .facilities
        .get_room(&user.actor(), property_id(&id)?, room_id(&room)?)
        .await?;
    Ok(Json(room))
}

/// `PUT /api/v1/properties/{id}/rooms/{room_id}`
pub async fn update_room<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room)): Path<(String, String)>,
    Json(patch): Json<RoomPatch>,
) -> Result<Json<Room>, ApiError> {
    let room = state
        .facilities
        .update_room(&user.actor(), property_id(&id)?, room_id(&room)?, patch)
        .await?;
    Ok(Json(room))
}

/// `DELETE /api/v1/properties/{id}/rooms/{room_id}`
pub async fn delete_room<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room)): Path<(String, String)>,
) -> Result<NoContent, ApiError> {
    state
        .facilities
        .delete_room(&user.actor(), property_id(&id)?, room_id(&room)?)
        .await?;
    Ok(NoContent)
}

/// `GET /api/v1/properties/{id}/rooms/{room_id}/machines`
pub async fn list_machines<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room)): Path<(String, String)>,
    Query(query): Query<ActiveQuery>,
) -> Result<Json<Vec<Machine>>, ApiError> {
    let machines = state
        .facilities
        .list_machines(
            &user.actor(),
            property_id(&id)?,
            room_id(&room)?,
            query.is_active,
        )
        .await?;
    Ok(Json(machines))
}

/// `POST /api/v1/properties/{id}/rooms/{room_id}/machines`
pub async fn create_machine<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room)): Path<(String, String)>,
    Json(req): Json<CreateMachineRequest>,
) -> Result<Created<Machine>, ApiError> {
    let machine = Machine::builder()
        .room_id(room_id(&room)?)
        .name(req.name)
        .model(req.model)
        .serial_number(req.serial_number)
        .manufacturer(req.manufacturer)
        .machine_type(req.machine_type)
        .status(req.status)
        .description(req.description)
        .installation_date(req.installation_date)
        .warranty_expiry(req.warranty_expiry)
        .last_maintenance(req.last_maintenance)
        .next_maintenance(req.next_maintenance)
        .build()?;
    let created = state
        .facilities
        .create_machine(&user.actor(), property_id(&id)?, machine)
        .await?;
    Ok(Created(created))
}

/// `GET /api/v1/properties/{id}/rooms/{room_id}/machines/{machine_id}`
pub async fn get_machine<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room, machine)): Path<(String, String, String)>,
) -> Result<Json<Machine>, ApiError> {
    let machine: MachineId = parse_id("machine", &machine)?;
    let machine = state
        .facilities
        .get_machine(&user.actor(), property_id(&id)?, room_id(&room)?, machine)
        .await?;
    Ok(Json(machine))
}

/// `PUT /api/v1/properties/{id}/rooms/{room_id}/machines/{machine_id}`
pub async fn update_machine<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room, machine)): Path<(String, String, String)>,
    Json(patch): Json<MachinePatch>,
) -> Result<Json<Machine>, ApiError> {
    let machine: MachineId = parse_id("machine", &machine)?;
    let machine = state
        .facilities
        .update_machine(
            &user.actor(),
            property_id(&id)?,
            room_id(&room)?,
            machine,
            patch,
        )
        .await?;
    Ok(Json(machine))
}

/// `DELETE /api/v1/properties/{id}/rooms/{room_id}/machines/{machine_id}`
pub async fn delete_machine<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path((id, room, machine)): Path<(String, String, String)>,
) -> Result<NoContent, ApiError> {
    let machine: MachineId = parse_id("machine", &machine)?;
    state
        .facilities
        .delete_machine(&user.actor(), property_id(&id)?, room_id(&room)?, machine)
        .await?;
    Ok(NoContent)
}
