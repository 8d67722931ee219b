//! Inspection service: recorded machine checks.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError};
use pmtrack_domain::id::InspectionId;
use pmtrack_domain::inspection::{
    Inspection, InspectionFilter, InspectionPatch, InspectionSummary,
};

use crate::ports::{InspectionRepository, MachineRepository, UserRepository};

/// Application service for inspections.
pub struct InspectionService<I, M, U> {
    inspections: I,
    machines: M,
    users: U,
}

impl<I, M, U> InspectionService<I, M, U>
where
    I: InspectionRepository,
    M: MachineRepository,
    U: UserRepository,
{
    pub fn new(inspections: I, machines: M, users: U) -> Self {
        Self {
            inspections,
            machines,
            users,
        }
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_inspections(
        &self,
        actor: &Actor,
        filter: &InspectionFilter,
    ) -> Result<Vec<Inspection>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.inspections.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown inspection.
    pub async fn get_inspection(
        &self,
        actor: &Actor,
        id: InspectionId,
    ) -> Result<Inspection, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find(id).await
    }

    /// Record an inspection of an existing machine.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown machine or inspector.
    #[tracing::instrument(skip(self, actor, inspection), fields(actor = %actor.username, machine_id = %inspection.machine_id))]
    pub async fn create_inspection(
        &self,
        actor: &Actor,
        inspection: Inspection,
    ) -> Result<Inspection, PmTrackError> {
        actor.authorize(Permission::RecordInspections)?;
        inspection.validate()?;
        if self.machines.get_by_id(inspection.machine_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Machine",
                id: inspection.machine_id.to_string(),
            }
            .into());
        }
        if self.users.get_by_id(inspection.inspector_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "User",
                id: inspection.inspector_id.to_string(),
            }
            .into());
        }
        let inspection = self.inspections.create(inspection).await?;
        tracing::info!(result = %inspection.result, "inspection recorded");
        Ok(inspection)
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown inspection.
    pub async fn update_inspection(
        &self,
        actor: &Actor,
        id: InspectionId,
        patch: InspectionPatch,
    ) -> Result<Inspection, PmTrackError> {
        actor.authorize(Permission::RecordInspections)?;
        let mut inspection = self.find(id).await?;
        inspection.apply(patch)?;
        self.inspections.update(inspection).await
    }

    /// Permanently remove an inspection.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageWorkOrders` and
    /// [`PmTrackError::NotFound`] for an unknown inspection.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_inspection(&self, actor: &Actor, id: InspectionId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageWorkOrders)?;
        self.find(id).await?;
        self.inspections.delete(id).await
    }

    /// Inspections that did not pass: `FAIL` or `NEEDS_ATTENTION`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn failed(&self, actor: &Actor) -> Result<Vec<Inspection>, PmTrackError> {
        self.list_inspections(
            actor,
            &InspectionFilter {
                failed: true,
                ..InspectionFilter::default()
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn summary(&self, actor: &Actor) -> Result<InspectionSummary, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let inspections = self.inspections.list(&InspectionFilter::default()).await?;
        Ok(InspectionSummary::from_inspections(&inspections))
    }

    async fn find(&self, id: InspectionId) -> Result<Inspection, PmTrackError> {
        self.inspections.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Inspection",
                id: id.to_string(),
            }
            .into()
        })
    }
}
