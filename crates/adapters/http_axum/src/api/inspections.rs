//! Inspection endpoints.

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use pmtrack_app::ports::Ports;
use pmtrack_domain::id::{InspectionId, MachineId, UserId};
use pmtrack_domain::inspection::{
    Inspection, InspectionFilter, InspectionPatch, InspectionResult, InspectionSummary,
};
use pmtrack_domain::time::Timestamp;

use super::{Created, NoContent, parse_id, parse_optional_id};
use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListInspectionsQuery {
    pub machine_id: Option<String>,
    pub inspector_id: Option<String>,
    pub result: Option<InspectionResult>,
    /// Only `FAIL` and `NEEDS_ATTENTION`.
    #[serde(default)]
    pub failed: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateInspectionRequest {
    pub machine_id: MachineId,
    /// Defaults to the caller.
    #[serde(default)]
    pub inspector_id: Option<UserId>,
    pub title: String,
    #[serde(default)]
    pub findings: Option<String>,
    pub result: InspectionResult,
    #[serde(default)]
    pub inspection_date: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct FailedDashboard {
    pub failed_count: usize,
    pub failed_inspections: Vec<Inspection>,
}

fn inspection_id(raw: &str) -> Result<InspectionId, ApiError> {
    parse_id("inspection", raw)
}

/// `GET /api/v1/inspections`
pub async fn list<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Query(query): Query<ListInspectionsQuery>,
) -> Result<Json<Vec<Inspection>>, ApiError> {
    let filter = InspectionFilter {
        machine_id: parse_optional_id("machine", query.machine_id.as_deref())?,
        inspector_id: parse_optional_id("user", query.inspector_id.as_deref())?,
        result: query.result,
        failed: query.failed,
    };
    let inspections = state
        .inspections
        .list_inspections(&user.actor(), &filter)
        .await?;
    Ok(Json(inspections))
}

/// `POST /api/v1/inspections`
pub async fn create<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Json(req): Json<CreateInspectionRequest>,
) -> Result<Created<Inspection>, ApiError> {
    let actor = user.actor();
    let mut builder = Inspection::builder()
        .machine_id(req.machine_id)
        .inspector_id(req.inspector_id.unwrap_or(actor.user_id))
        .title(req.title)
        .findings(req.findings)
        .result(req.result);
    if let Some(date) = req.inspection_date {
        builder = builder.inspection_date(date);
    }
    let inspection = builder.build()?;
    Ok(Created(
        state
            .inspections
            .create_inspection(&actor, inspection)
            .await?,
    ))
}

/// `GET /api/v1/inspections/{id}`
pub async fn get<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Inspection>, ApiError> {
    let inspection = state
        .inspections
        .get_inspection(&user.actor(), inspection_id(&id)?)
        .await?;
    Ok(Json(inspection))
}

/// `PUT /api/v1/inspections/{id}`
pub async fn update<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(patch): Json<InspectionPatch>,
) -> Result<Json<Inspection>, ApiError> {
    let inspection = state
        .inspections
        .update_inspection(&user.actor(), inspection_id(&id)?, patch)
        .await?;
    Ok(Json(inspection))
}

/// `DELETE /api/v1/inspections/{id}`
pub async fn delete<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<NoContent, ApiError> {
    state
        .inspections
        .delete_inspection(&user.actor(), inspection_id(&id)?)
        .await?;
    Ok(NoContent)
}

/// `GET /api/v1/inspections/stats/summary`
pub async fn summary<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<InspectionSummary>, ApiError> {
    Ok(Json(state.inspections.summary(&user.actor()).await?))
}

/// `GET /api/v1/inspections/dashboard/failed`
pub async fn failed<P: Ports>(
    State(state): State<AppState<P>>,
    user: CurrentUser,
) -> Result<Json<FailedDashboard>, ApiError> {
    let inspections = state.inspections.failed(&user.actor()).await?;
    Ok(Json(FailedDashboard {
        failed_count: inspections.len(),
        failed_inspections: inspections,
    }))
}
