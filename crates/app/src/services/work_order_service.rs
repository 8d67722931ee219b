//! Work order service: maintenance requests against machines.

use chrono::Duration;
use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::{MachineId, UserId, WorkOrderId};
use pmtrack_domain::time::now;
use pmtrack_domain::work_order::{
    WorkOrder, WorkOrderFilter, WorkOrderPatch, WorkOrderStatus, WorkOrderSummary,
};

use crate::ports::{MachineRepository, UserRepository, WorkOrderRepository};

/// Longest look-back accepted by [`WorkOrderService::completed_since`].
pub const MAX_DAYS_BACK: i64 = 3650;

/// Application service for work orders.
pub struct WorkOrderService<W, M, U> {
    orders: W,
    machines: M,
    users: U,
}

impl<W, M, U> WorkOrderService<W, M, U>
where
    W: WorkOrderRepository,
    M: MachineRepository,
    U: UserRepository,
{
    pub fn new(orders: W, machines: M, users: U) -> Self {
        Self {
            orders,
            machines,
            users,
        }
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_work_orders(
        &self,
        actor: &Actor,
        filter: &WorkOrderFilter,
    ) -> Result<Vec<WorkOrder>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.orders.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown work order.
    pub async fn get_work_order(
        &self,
        actor: &Actor,
        id: WorkOrderId,
    ) -> Result<WorkOrder, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find(id).await
    }

    /// Create a work order for an existing machine.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageWorkOrders` and
    /// [`PmTrackError::NotFound`] for an unknown machine or assignee.
    #[tracing::instrument(skip(self, actor, order), fields(actor = %actor.username, machine_id = %order.machine_id))]
    pub async fn create_work_order(
        &self,
        actor: &Actor,
        order: WorkOrder,
    ) -> Result<WorkOrder, PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        order.validate()?;
        self.check_machine(order.machine_id).await?;
        if order.created_by_id != actor.user_id {
            self.check_user(order.created_by_id).await?;
        }
        if let Some(assignee) = order.assigned_to_id {
            self.check_user(assignee).await?;
        }
        self.orders.create(order).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown work order or
    /// assignee and [`PmTrackError::Validation`] for an invalid patch.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_work_order(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        patch: WorkOrderPatch,
    ) -> Result<WorkOrder, PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        let mut order = self.find(id).await?;
        if let Some(assignee) = patch.assigned_to_id {
            self.check_user(assignee).await?;
        }
        order.apply(patch)?;
        self.orders.update(order).await
    }

    /// Hand the work order to a user.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown work order or user.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn assign(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        user_id: UserId,
    ) -> Result<WorkOrder, PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        let mut order = self.find(id).await?;
        self.check_user(user_id).await?;
        order.assign_to(user_id);
        self.orders.update(order).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown work order.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: WorkOrderId,
        status: WorkOrderStatus,
    ) -> Result<WorkOrder, PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        let mut order = self.find(id).await?;
        order.set_status(status, now());
        self.orders.update(order).await
    }

    /// Soft delete a work order.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown work order.
    pub async fn delete_work_order(&self, actor: &Actor, id: WorkOrderId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        let mut order = self.find(id).await?;
        order.deactivate();
        self.orders.update(order).await?;
        Ok(())
    }

    /// Aggregate figures over active work orders.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn summary(&self, actor: &Actor) -> Result<WorkOrderSummary, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let orders = self.orders.list(&WorkOrderFilter::default()).await?;
        Ok(WorkOrderSummary::from_orders(&orders))
    }

    /// Active orders still awaiting work: `DRAFT` or `APPROVED`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn pending(&self, actor: &Actor) -> Result<Vec<WorkOrder>, PmTrackError> {
        let mut orders = self.active_orders(actor, None).await?;
        orders.retain(|order| {
            matches!(
                order.status,
                WorkOrderStatus::Draft | WorkOrderStatus::Approved
            )
        });
        Ok(orders)
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn in_progress(&self, actor: &Actor) -> Result<Vec<WorkOrder>, PmTrackError> {
        self.active_orders(actor, Some(WorkOrderStatus::InProgress))
            .await
    }

    /// Active orders completed within the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] unless `days` is within
    /// `0..=MAX_DAYS_BACK`.
    pub async fn completed_since(
        &self,
        actor: &Actor,
        days: i64,
    ) -> Result<Vec<WorkOrder>, PmTrackError> {
        let since = Duration::try_days(days)
            .filter(|_| (0..=MAX_DAYS_BACK).contains(&days))
            .and_then(|back| now().checked_sub_signed(back))
            .ok_or(ValidationError::OutOfRange {
                field: "days",
                min: 0,
                max: MAX_DAYS_BACK,
            })?;
        let mut orders = self
            .active_orders(actor, Some(WorkOrderStatus::Completed))
            .await?;
        orders.retain(|order| order.completed_at.is_some_and(|at| at >= since));
        Ok(orders)
    }

    async fn active_orders(
        &self,
        actor: &Actor,
        status: Option<WorkOrderStatus>,
    ) -> Result<Vec<WorkOrder>, PmTrackError> {
        self.list_work_orders(
            actor,
            &WorkOrderFilter {
                status,
                is_active: Some(true),
                ..WorkOrderFilter::default()
            },
        )
        .await
    }

    async fn find(&self, id: WorkOrderId) -> Result<WorkOrder, PmTrackError> {
        self.orders.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "WorkOrder",
                id: id.to_string(),
            }
            .into()
        })
    }

    async fn check_machine(&self, id: MachineId) -> Result<(), PmTrackError> {
        match self.machines.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "Machine",
                id: id.to_string(),
            }
            .into()),
        }
    }

    async fn check_user(&self, id: UserId) -> Result<(), PmTrackError> {
        match self.users.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(NotFoundError {
                entity: "User",
                id: id.to_string(),
            }
            .into()),
        }
    }
}
