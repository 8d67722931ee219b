//! Work order: a request for maintenance work on a machine.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{MachineId, UserId, WorkOrderId};
use crate::priority::Priority;
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Approval and execution state of a [`WorkOrder`].
    #[derive(Default)]
    WorkOrderStatus {
        #[default]
        Draft => "DRAFT",
        Approved => "APPROVED",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// Why the work is being done.
    #[derive(Default)]
    WorkOrderType {
        #[default]
        Preventive => "PREVENTIVE",
        Corrective => "CORRECTIVE",
        Emergency => "EMERGENCY",
        Inspection => "INSPECTION",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub machine_id: MachineId,
    pub created_by_id: UserId,
    pub assigned_to_id: Option<UserId>,
    pub work_order_type: WorkOrderType,
    pub status: WorkOrderStatus,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub scheduled_date: Option<Timestamp>,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// In cents.
    pub cost_estimate: Option<i64>,
    /// In cents.
    pub actual_cost: Option<i64>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl WorkOrder {
    pub const TITLE_MAX: usize = 200;

    /// Create a builder for constructing a [`WorkOrder`].
    #[must_use]
    pub fn builder() -> WorkOrderBuilder {
        WorkOrderBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the title is empty or too
    /// long, or hours and costs are negative.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        validate::non_negative("estimated_hours", self.estimated_hours)?;
        validate::non_negative("actual_hours", self.actual_hours)?;
        validate::non_negative("cost_estimate", self.cost_estimate)?;
        validate::non_negative("actual_cost", self.actual_cost)?;
        Ok(())
    }

    /// Change the status. `COMPLETED` stamps `completed_at`;
    /// `IN_PROGRESS` stamps `started_at` the first time.
    pub fn set_status(&mut self, status: WorkOrderStatus, at: Timestamp) {
        self.status = status;
        match status {
            WorkOrderStatus::Completed => self.completed_at = Some(at),
            WorkOrderStatus::InProgress => {
                self.started_at.get_or_insert(at);
            }
            _ => {}
        }
        self.updated_at = at;
    }

    pub fn assign_to(&mut self, user_id: UserId) {
        self.assigned_to_id = Some(user_id);
        self.updated_at = now();
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: WorkOrderPatch) -> Result<(), PmTrackError> {
        let at = now();
        if let Some(id) = patch.assigned_to_id {
            self.assigned_to_id = Some(id);
        }
        if let Some(work_order_type) = patch.work_order_type {
            self.work_order_type = work_order_type;
        }
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(hours) = patch.estimated_hours {
            self.estimated_hours = Some(hours);
        }
        if let Some(hours) = patch.actual_hours {
            self.actual_hours = Some(hours);
        }
        if let Some(date) = patch.scheduled_date {
            self.scheduled_date = Some(date);
        }
        if let Some(cost) = patch.cost_estimate {
            self.cost_estimate = Some(cost);
        }
        if let Some(cost) = patch.actual_cost {
            self.actual_cost = Some(cost);
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(status) = patch.status {
            self.set_status(status, at);
        }
        self.updated_at = at;
        self.validate()
    }

    /// Soft delete.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = now();
    }
}

/// Partial update of a [`WorkOrder`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkOrderPatch {
    pub assigned_to_id: Option<UserId>,
    pub work_order_type: Option<WorkOrderType>,
    pub status: Option<WorkOrderStatus>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub scheduled_date: Option<Timestamp>,
    pub cost_estimate: Option<i64>,
    pub actual_cost: Option<i64>,
    pub notes: Option<String>,
}

/// Criteria for listing work orders. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOrderFilter {
    pub machine_id: Option<MachineId>,
    pub created_by_id: Option<UserId>,
    pub assigned_to_id: Option<UserId>,
    pub work_order_type: Option<WorkOrderType>,
    pub status: Option<WorkOrderStatus>,
    pub priority: Option<Priority>,
    pub is_active: Option<bool>,
}

impl WorkOrderFilter {
    #[must_use]
    pub fn matches(&self, order: &WorkOrder) -> bool {
        self.machine_id.is_none_or(|id| order.machine_id == id)
            && self.created_by_id.is_none_or(|id| order.created_by_id == id)
            && self
                .assigned_to_id
                .is_none_or(|id| order.assigned_to_id == Some(id))
            && self
                .work_order_type
                .is_none_or(|kind| order.work_order_type == kind)
            && self.status.is_none_or(|status| order.status == status)
            && self.priority.is_none_or(|priority| order.priority == priority)
            && self.is_active.is_none_or(|active| order.is_active == active)
    }
}

/// Aggregate figures over active work orders.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WorkOrderSummary {
    pub total_work_orders: u64,
    /// `DRAFT` and `APPROVED`.
    pub pending_work_orders: u64,
    pub in_progress_work_orders: u64,
    pub completed_work_orders: u64,
    pub total_estimated_cost: i64,
    pub total_actual_cost: i64,
    /// Completed share of the total, as a percentage.
    pub completion_rate: f64,
}

impl WorkOrderSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_orders<'a>(orders: impl IntoIterator<Item = &'a WorkOrder>) -> Self {
        let mut summary = Self {
            total_work_orders: 0,
            pending_work_orders: 0,
            in_progress_work_orders: 0,
            completed_work_orders: 0,
            total_estimated_cost: 0,
            total_actual_cost: 0,
            completion_rate: 0.0,
        };
        for order in orders.into_iter().filter(|order| order.is_active) {
            summary.total_work_orders += 1;
            match order.status {
                WorkOrderStatus::Draft | WorkOrderStatus::Approved => {
                    summary.pending_work_orders += 1;
                }
                WorkOrderStatus::InProgress => summary.in_progress_work_orders += 1,
                WorkOrderStatus::Completed => summary.completed_work_orders += 1,
                WorkOrderStatus::Cancelled => {}
            }
            summary.total_estimated_cost = summary
                .total_estimated_cost
                .saturating_add(order.cost_estimate.unwrap_or(0));
            summary.total_actual_cost = summary
                .total_actual_cost
                .saturating_add(order.actual_cost.unwrap_or(0));
        }
        if summary.total_work_orders > 0 {
            summary.completion_rate = summary.completed_work_orders as f64
                / summary.total_work_orders as f64
                * 100.0;
        }
        summary
    }
}

/// Step-by-step builder for [`WorkOrder`].
#[derive(Debug, Default)]
pub struct WorkOrderBuilder {
    id: Option<WorkOrderId>,
    machine_id: Option<MachineId>,
    created_by_id: Option<UserId>,
    assigned_to_id: Option<UserId>,
    work_order_type: Option<WorkOrderType>,
    status: Option<WorkOrderStatus>,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    estimated_hours: Option<i64>,
    scheduled_date: Option<Timestamp>,
    cost_estimate: Option<i64>,
    notes: Option<String>,
}

impl WorkOrderBuilder {
    #[must_use]
    pub fn id(mut self, id: WorkOrderId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn machine_id(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    #[must_use]
    pub fn created_by_id(mut self, created_by_id: UserId) -> Self {
        self.created_by_id = Some(created_by_id);
        self
    }

    #[must_use]
    pub fn assigned_to_id(mut self, assigned_to_id: Option<UserId>) -> Self {
        self.assigned_to_id = assigned_to_id;
        self
    }

    #[must_use]
    pub fn work_order_type(mut self, work_order_type: WorkOrderType) -> Self {
        self.work_order_type = Some(work_order_type);
        self
    }

    #[must_use]
    pub fn status(mut self, status: WorkOrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    #[must_use]
    pub fn estimated_hours(mut self, hours: Option<i64>) -> Self {
        self.estimated_hours = hours;
        self
    }

    #[must_use]
    pub fn scheduled_date(mut self, date: Option<Timestamp>) -> Self {
        self.scheduled_date = date;
        self
    }

    #[must_use]
    pub fn cost_estimate(mut self, cents: Option<i64>) -> Self {
        self.cost_estimate = cents;
        self
    }

    #[must_use]
    pub fn notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Consume the builder, validate, and return a [`WorkOrder`].
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `machine_id` or
    /// `created_by_id` is missing, or a field is invalid.
    pub fn build(self) -> Result<WorkOrder, PmTrackError> {
        let machine_id = self
            .machine_id
            .ok_or(ValidationError::MissingField("machine_id"))?;
        let created_by_id = self
            .created_by_id
            .ok_or(ValidationError::MissingField("created_by_id"))?;
        let created_at = now();
        let mut order = WorkOrder {
            id: self.id.unwrap_or_default(),
            machine_id,
            created_by_id,
            assigned_to_id: self.assigned_to_id,
            work_order_type: self.work_order_type.unwrap_or_default(),
            status: WorkOrderStatus::Draft,
            title: self.title.unwrap_or_default(),
            description: self.description,
            priority: self.priority.unwrap_or_default(),
            estimated_hours: self.estimated_hours,
            actual_hours: None,
            scheduled_date: self.scheduled_date,
            started_at: None,
            completed_at: None,
            cost_estimate: self.cost_estimate,
            actual_cost: None,
            notes: self.notes,
            is_active: true,
            created_at,
            updated_at: created_at,
        };
        if let Some(status) = self.status {
            order.set_status(status, created_at);
        }
        order.validate()?;
        Ok(order)
    }
}
