//! Work order endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::{MachineId, UserId, WorkOrderId};
use pmtrack_domain::priority::Priority;
use pmtrack_domain::time::Timestamp;
use pmtrack_domain::work_order::{
    WorkOrder, WorkOrderFilter, WorkOrderPatch, WorkOrderStatus, WorkOrderSummary, WorkOrderType,
};

use super::{Created, NoContent, parse_id, parse_optional_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListWorkOrdersQuery {
    pub machine_id: Option<String>,
    pub created_by_id: Option<String>,
    pub assigned_to_id: Option<String>,
    pub work_order_type: Option<WorkOrderType>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    pub is_active: Option<bool>,
}

impl ListWorkOrdersQuery {
    fn filter(&self) -> Result<WorkOrderFilter, ApiError> {
        Ok(WorkOrderFilter {
            machine_id: parse_optional_id("machine", self.machine_id.as_deref())?,
            created_by_id: parse_optional_id("user", self.created_by_id.as_deref())?,
            assigned_to_id: parse_optional_id("user", self.assigned_to_id.as_deref())?,
            work_order_type: self.work_order_type,
            status: self.status,
            priority: self.priority,
            is_active: self.is_active,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateWorkOrderRequest {
    pub machine_id: MachineId,
    /// Defaults to the caller.
    #[serde(default)]
    pub created_by_id: Option<UserId>,
    #[serde(default)]
    pub assigned_to_id: Option<UserId>,
    #[serde(default)]
    pub work_order_type: WorkOrderType,
    #[serde(default)]
    pub status: WorkOrderStatus,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub estimated_hours: Option<i64>,
    #[serde(default)]
    pub scheduled_date: Option<Timestamp>,
    #[serde(default)]
    pub cost_estimate: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to_id: UserId,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: WorkOrderStatus,
}

#[derive(Debug, Deserialize)]
pub struct CompletedQuery {
    #[serde(default = "default_days_back")]
    pub days: i64,
}

const fn default_days_back() -> i64 {
    30
}

#[derive(Debug, Serialize)]
pub struct PendingDashboard {
    pub pending_count: usize,
    pub pending_work_orders: Vec<WorkOrder>,
}

#[derive(Debug, Serialize)]
pub struct InProgressDashboard {
    pub in_progress_count: usize,
    pub in_progress_work_orders: Vec<WorkOrder>,
}

#[derive(Debug, Serialize)]
pub struct CompletedDashboard {
    pub completed_count: usize,
    pub completed_work_orders: Vec<WorkOrder>,
    pub days_back: i64,
}

fn work_order_id(raw: &str) -> Result<WorkOrderId, ApiError> {
    parse_id("work order", raw)
}

/// `GET /api/v1/work-orders`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListWorkOrdersQuery>,
) -> Result<Json<Vec<WorkOrder>>, ApiError> {
    let orders = state
        .work_orders
        .list_work_orders(&user.actor(), &query.filter()?)
        .await?;
    Ok(Json(orders))
}

/// `POST /api/v1/work-orders`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateWorkOrderRequest>,
) -> Result<Created<WorkOrder>, ApiError> {
    let actor = user.actor();
    let order = WorkOrder::builder()
        .machine_id(req.machine_id)
        .created_by_id(req.created_by_id.unwrap_or(actor.user_id))
        .assigned_to_id(req.assigned_to_id)
        .work_order_type(req.work_order_type)
        .status(req.status)
        .title(req.title)
        .description(req.description)
        .priority(req.priority)
        .estimated_hours(req.estimated_hours)
        .scheduled_date(req.scheduled_date)
        .cost_estimate(req.cost_estimate)
        .notes(req.notes)
        .build()?;
    Ok(Created(
        state.work_orders.create_work_order(&actor, order).await?,
    ))
}

/// `GET /api/v1/work-orders/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<WorkOrder>, ApiError> {
    let order = state
        .work_orders
        .get_work_order(&user.actor(), work_order_id(&id)?)
        .await?;
    Ok(Json(order))
}

/// `PUT /api/v1/work-orders/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<WorkOrderPatch>,
) -> Result<Json<WorkOrder>, ApiError> {
    let order = state
        .work_orders
        .update_work_order(&user.actor(), work_order_id(&id)?, patch)
        .await?;
    Ok(Json(order))
}

/// `DELETE /api/v1/work-orders/{id}`
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state
        .work_orders
        .delete_work_order(&user.actor(), work_order_id(&id)?)
        .await?;
    Ok(NoContent)
}

/// `PUT /api/v1/work-orders/{id}/assign`
pub async fn assign<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<AssignRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    let order = state
        .work_orders
        .assign(&user.actor(), work_order_id(&id)?, req.assigned_to_id)
        .await?;
    Ok(Json(order))
}

/// `PUT /api/v1/work-orders/{id}/status`
pub async fn set_status<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<WorkOrder>, ApiError> {
    let order = state
        .work_orders
        .set_status(&user.actor(), work_order_id(&id)?, req.status)
        .await?;
    Ok(Json(order))
}

/// `GET /api/v1/work-orders/stats/summary`
pub async fn summary<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<WorkOrderSummary>, ApiError> {
    Ok(Json(state.work_orders.summary(&user.actor()).await?))
}

/// `GET /api/v1/work-orders/dashboard/pending`
pub async fn pending<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<PendingDashboard>, ApiError> {
    let orders = state.work_orders.pending(&user.actor()).await?;
    Ok(Json(PendingDashboard {
        pending_count: orders.len(),
        pending_work_orders: orders,
    }))
}

/// `GET /api/v1/work-orders/dashboard/in-progress`
pub async fn in_progress<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<InProgressDashboard>, ApiError> {
    let orders = state.work_orders.in_progress(&user.actor()).await?;
    Ok(Json(InProgressDashboard {
        in_progress_count: orders.len(),
        in_progress_work_orders: orders,
    }))
}

/// `GET /api/v1/work-orders/dashboard/completed?days=30`
pub async fn completed<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<CompletedQuery>,
) -> Result<Json<CompletedDashboard>, ApiError> {
    let orders = state
        .work_orders
        .completed_since(&user.actor(), query.days)
        .await?;
    Ok(Json(CompletedDashboard {
        completed_count: orders.len(),
        completed_work_orders: orders,
        days_back: query.days,
    }))
}
