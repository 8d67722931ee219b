//! Read-only admin panel listings: users, properties and work orders.

use std::collections::HashMap;

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse, Response};

use pmtrack_app::ports::Ports;
use pmtrack_app::services::facility_service::FacilityInventory;
use pmtrack_domain::user::User;
use pmtrack_domain::work_order::{WorkOrder, WorkOrderFilter};

use super::{PanelError, display_optional, display_time};
use crate::auth::AdminSession;
use crate::state::AppState;

pub struct UserRow {
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub active: bool,
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            name: user.full_name(),
            email: user.email.clone(),
            role: user.role.as_str(),
            active: user.is_active,
        }
    }
}

pub struct PropertyRow {
    pub name: String,
    pub address: String,
    pub rooms: usize,
    pub machines: usize,
    pub active: bool,
}

/// One row per property with the size of its facility tree.
fn property_rows(inventory: &FacilityInventory) -> Vec<PropertyRow> {
    let room_property: HashMap<_, _> = inventory
        .rooms
        .iter()
        .map(|room| (room.id, room.property_id))
        .collect();
    inventory
        .properties
        .iter()
        .map(|property| PropertyRow {
            name: property.name.clone(),
            address: display_optional(property.address.as_deref()),
            rooms: inventory
                .rooms
                .iter()
                .filter(|room| room.property_id == property.id)
                .count(),
            machines: inventory
                .machines
                .iter()
                .filter(|machine| room_property.get(&machine.room_id) == Some(&property.id))
                .count(),
            active: property.is_active,
        })
        .collect()
}

pub struct WorkOrderRow {
    pub title: String,
    pub kind: &'static str,
    pub status: &'static str,
    pub priority: &'static str,
    pub scheduled: String,
    pub created: String,
}

impl From<&WorkOrder> for WorkOrderRow {
    fn from(order: &WorkOrder) -> Self {
        Self {
            title: order.title.clone(),
            kind: order.work_order_type.as_str(),
            status: order.status.as_str(),
            priority: order.priority.as_str(),
            scheduled: order
                .scheduled_date
                .map_or_else(|| "-".to_string(), display_time),
            created: display_time(order.created_at),
        }
    }
}

/// Users page template.
#[derive(Template)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    username: String,
    users: Vec<UserRow>,
}

impl IntoResponse for UsersTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Properties page template.
#[derive(Template)]
#[template(path = "properties.html")]
pub struct PropertiesTemplate {
    username: String,
    properties: Vec<PropertyRow>,
}

impl IntoResponse for PropertiesTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// Work orders page template.
#[derive(Template)]
#[template(path = "work_orders.html")]
pub struct WorkOrdersTemplate {
    username: String,
    work_orders: Vec<WorkOrderRow>,
}

impl IntoResponse for WorkOrdersTemplate {
    fn into_response(self) -> Response {
        Html(self.to_string()).into_response()
    }
}

/// `GET /admin/users`
pub async fn users<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
) -> Result<UsersTemplate, PanelError> {
    let users = state.users.list_users(&session.actor(), true).await?;
    Ok(UsersTemplate {
        username: session.0.user.username,
        users: users.iter().map(UserRow::from).collect(),
    })
}

/// `GET /admin/properties`
pub async fn properties<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
) -> Result<PropertiesTemplate, PanelError> {
    let inventory = state.facilities.inventory(&session.actor()).await?;
    Ok(PropertiesTemplate {
        username: session.0.user.username,
        properties: property_rows(&inventory),
    })
}

/// `GET /admin/work-orders`
pub async fn work_orders<P: Ports>(
    State(state): State<AppState<P>>,
    session: AdminSession,
) -> Result<WorkOrdersTemplate, PanelError> {
    let filter = WorkOrderFilter {
        is_active: Some(true),
        ..WorkOrderFilter::default()
    };
    let orders = state
        .work_orders
        .list_work_orders(&session.actor(), &filter)
        .await?;
    Ok(WorkOrdersTemplate {
        username: session.0.user.username,
        work_orders: orders.iter().map(WorkOrderRow::from).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmtrack_domain::machine::Machine;
    use pmtrack_domain::property::Property;
    use pmtrack_domain::room::Room;

    #[test]
    fn should_count_rooms_and_machines_per_property() {
        let plant = Property::builder().name("Plant").build().unwrap();
        let office = Property::builder().name("Office").build().unwrap();
        let boiler_room = Room::builder()
            .property_id(plant.id)
            .name("Boiler room")
            .build()
            .unwrap();
        let lobby = Room::builder()
            .property_id(office.id)
            .name("Lobby")
            .build()
            .unwrap();
        let machines = vec![
            Machine::builder()
                .room_id(boiler_room.id)
                .name("Boiler")
                .build()
                .unwrap(),
            Machine::builder()
                .room_id(boiler_room.id)
                .name("Pump")
                .build()
                .unwrap(),
        ];
        let inventory = FacilityInventory {
            properties: vec![plant, office],
            rooms: vec![boiler_room, lobby],
            machines,
        };

        let rows = property_rows(&inventory);
        assert_eq!((rows[0].rooms, rows[0].machines), (1, 2));
        assert_eq!((rows[1].rooms, rows[1].machines), (1, 0));
        assert_eq!(rows[1].address, "-");
    }
}
