//! Maintenance service: procedures, PM schedules and their executions.
//!
//! Completing an execution reschedules its parent: the schedule's
//! `last_completed` becomes the completion time and `next_due` moves one
//! recurrence past it. Both records are written together.

use chrono::Duration;
use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::{MachineId, PmExecutionId, PmScheduleId, ProcedureId, TopicId, UserId};
use pmtrack_domain::pm_schedule::{
    PmExecution, PmExecutionFilter, PmExecutionPatch, PmSchedule, PmScheduleFilter,
    PmSchedulePatch, PmSummary,
};
use pmtrack_domain::procedure::{Procedure, ProcedureFilter, ProcedurePatch};
use pmtrack_domain::time::now;

use crate::ports::{
    MachineRepository, PmExecutionRepository, PmScheduleRepository, ProcedureRepository,
    TopicRepository, UserRepository,
};

/// Longest look-ahead accepted by [`MaintenanceService::upcoming`].
pub const MAX_DAYS_AHEAD: i64 = 3650;

fn not_found(entity: &'static str, id: impl ToString) -> PmTrackError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

/// Application service for preventive maintenance.
pub struct MaintenanceService<R, S, E, T, M, U> {
    procedures: R,
    schedules: S,
    executions: E,
    topics: T,
    machines: M,
    users: U,
}

impl<R, S, E, T, M, U> MaintenanceService<R, S, E, T, M, U>
where
    R: ProcedureRepository,
    S: PmScheduleRepository,
    E: PmExecutionRepository,
    T: TopicRepository,
    M: MachineRepository,
    U: UserRepository,
{
    pub fn new(procedures: R, schedules: S, executions: E, topics: T, machines: M, users: U) -> Self {
        Self {
            procedures,
            schedules,
            executions,
            topics,
            machines,
            users,
        }
    }

    // Procedures

    /// Procedures filed under `topic_id`, optionally narrowed by activity.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown topic.
    pub async fn list_procedures(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        is_active: Option<bool>,
    ) -> Result<Vec<Procedure>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.check_topic(topic_id).await?;
        self.procedures
            .list(&ProcedureFilter {
                topic_id: Some(topic_id),
                is_active,
            })
            .await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the procedure does not exist
    /// under `topic_id`.
    pub async fn get_procedure(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        id: ProcedureId,
    ) -> Result<Procedure, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_procedure(topic_id, id).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageFacilities` and
    /// [`PmTrackError::NotFound`] for an unknown topic.
    #[tracing::instrument(skip(self, actor, procedure), fields(actor = %actor.username, topic_id = %procedure.topic_id))]
    pub async fn create_procedure(
        &self,
        actor: &Actor,
        procedure: Procedure,
    ) -> Result<Procedure, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        procedure.validate()?;
        self.check_topic(procedure.topic_id).await?;
        self.procedures.create(procedure).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the procedure does not exist
    /// under `topic_id` and [`PmTrackError::Validation`] for an invalid patch.
    pub async fn update_procedure(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        id: ProcedureId,
        patch: ProcedurePatch,
    ) -> Result<Procedure, PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut procedure = self.find_procedure(topic_id, id).await?;
        procedure.apply(patch)?;
        self.procedures.update(procedure).await
    }

    /// Soft delete a procedure.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] when the procedure does not exist
    /// under `topic_id`.
    pub async fn delete_procedure(
        &self,
        actor: &Actor,
        topic_id: TopicId,
        id: ProcedureId,
    ) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageFacilities)?;
        let mut procedure = self.find_procedure(topic_id, id).await?;
        procedure.deactivate();
        self.procedures.update(procedure).await?;
        Ok(())
    }

    // Schedules

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_schedules(
        &self,
        actor: &Actor,
        filter: &PmScheduleFilter,
    ) -> Result<Vec<PmSchedule>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.schedules.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown schedule.
    pub async fn get_schedule(
        &self,
        actor: &Actor,
        id: PmScheduleId,
    ) -> Result<PmSchedule, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_schedule(id).await
    }

    /// Create a schedule for an existing machine, procedure and user.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageMaintenance` and
    /// [`PmTrackError::NotFound`] when a referenced record is missing.
    #[tracing::instrument(skip(self, actor, schedule), fields(actor = %actor.username, machine_id = %schedule.machine_id, frequency = %schedule.frequency))]
    pub async fn create_schedule(
        &self,
        actor: &Actor,
        schedule: PmSchedule,
    ) -> Result<PmSchedule, PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        schedule.validate()?;
        self.check_references(schedule.machine_id, schedule.procedure_id, schedule.user_id)
            .await?;
        let schedule = self.schedules.create(schedule).await?;
        tracing::info!(schedule_id = %schedule.id, next_due = %schedule.next_due, "pm schedule created");
        Ok(schedule)
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown schedule or a missing
    /// referenced record and [`PmTrackError::Validation`] for an invalid patch.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_schedule(
        &self,
        actor: &Actor,
        id: PmScheduleId,
        patch: PmSchedulePatch,
    ) -> Result<PmSchedule, PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        let mut schedule = self.find_schedule(id).await?;
        schedule.apply(patch)?;
        self.check_references(schedule.machine_id, schedule.procedure_id, schedule.user_id)
            .await?;
        self.schedules.update(schedule).await
    }

    /// Soft delete a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown schedule.
    pub async fn delete_schedule(&self, actor: &Actor, id: PmScheduleId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        let mut schedule = self.find_schedule(id).await?;
        schedule.deactivate();
        self.schedules.update(schedule).await?;
        Ok(())
    }

    /// Active schedules whose due date has passed, most overdue first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn overdue(&self, actor: &Actor) -> Result<Vec<PmSchedule>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.schedules.list(&PmScheduleFilter::overdue(now())).await
    }

    /// Active schedules falling due within the next `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::OutOfRange`] unless `days` is within
    /// `0..=MAX_DAYS_AHEAD`.
    pub async fn upcoming(&self, actor: &Actor, days: i64) -> Result<Vec<PmSchedule>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let from = now();
        let until = Duration::try_days(days)
            .filter(|_| (0..=MAX_DAYS_AHEAD).contains(&days))
            .and_then(|ahead| from.checked_add_signed(ahead))
            .ok_or(ValidationError::OutOfRange {
                field: "days",
                min: 0,
                max: MAX_DAYS_AHEAD,
            })?;
        self.schedules
            .list(&PmScheduleFilter::upcoming(from, until))
            .await
    }

    // Executions

    /// Runs of one schedule, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown schedule.
    pub async fn list_executions(
        &self,
        actor: &Actor,
        filter: &PmExecutionFilter,
    ) -> Result<Vec<PmExecution>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        if let Some(schedule_id) = filter.pm_schedule_id {
            self.find_schedule(schedule_id).await?;
        }
        self.executions.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown execution.
    pub async fn get_execution(
        &self,
        actor: &Actor,
        id: PmExecutionId,
    ) -> Result<PmExecution, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_execution(id).await
    }

    /// Record a run of an existing schedule. A run created already
    /// `COMPLETED` reschedules its parent straight away.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `RecordMaintenance` and
    /// [`PmTrackError::NotFound`] for an unknown schedule.
    #[tracing::instrument(skip(self, actor, execution), fields(actor = %actor.username, schedule_id = %execution.pm_schedule_id))]
    pub async fn create_execution(
        &self,
        actor: &Actor,
        execution: PmExecution,
    ) -> Result<PmExecution, PmTrackError> {
        actor.authorize(Permission::RecordMaintenance)?;
        let schedule = self.find_schedule(execution.pm_schedule_id).await?;
        if execution.executed_by_id != actor.user_id {
            self.check_user(execution.executed_by_id).await?;
        }
        if execution.is_completed() {
            return self.complete(execution, schedule).await;
        }
        self.executions.create(execution).await
    }

    /// Update a run. Moving it into `COMPLETED` reschedules its parent.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown execution and
    /// [`ValidationError::DueDateOutOfRange`] when the next due date cannot
    /// be represented.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_execution(
        &self,
        actor: &Actor,
        id: PmExecutionId,
        patch: PmExecutionPatch,
    ) -> Result<PmExecution, PmTrackError> {
        actor.authorize(Permission::RecordMaintenance)?;
        let mut execution = self.find_execution(id).await?;
        let was_completed = execution.is_completed();
        execution.apply(patch);
        if execution.is_completed() && !was_completed {
            let schedule = self.find_schedule(execution.pm_schedule_id).await?;
            return self.complete(execution, schedule).await;
        }
        self.executions.update(execution).await
    }

    /// Permanently remove a run. The schedule keeps its dates.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageMaintenance` and
    /// [`PmTrackError::NotFound`] for an unknown execution.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_execution(&self, actor: &Actor, id: PmExecutionId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        self.find_execution(id).await?;
        self.executions.delete(id).await
    }

    /// Schedule and execution counters for the admin overview.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn summary(&self, actor: &Actor) -> Result<PmSummary, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let schedules = self.schedules.list(&PmScheduleFilter::default()).await?;
        let executions = self.executions.list(&PmExecutionFilter::default()).await?;
        Ok(PmSummary::from_records(&schedules, &executions, now()))
    }

    async fn complete(
        &self,
        mut execution: PmExecution,
        mut schedule: PmSchedule,
    ) -> Result<PmExecution, PmTrackError> {
        let completed_at = execution.completed_at.unwrap_or_else(now);
        let next_due = schedule.record_completion(completed_at)?;
        execution.next_due_calculated = Some(next_due);
        let (execution, schedule) = self.executions.complete(execution, schedule).await?;
        tracing::info!(
            execution_id = %execution.id,
            schedule_id = %schedule.id,
            next_due = %schedule.next_due,
            "pm execution completed"
        );
        Ok(execution)
    }

    async fn find_procedure(
        &self,
        topic_id: TopicId,
        id: ProcedureId,
    ) -> Result<Procedure, PmTrackError> {
        match self.procedures.get_by_id(id).await? {
            Some(procedure) if procedure.topic_id == topic_id => Ok(procedure),
            _ => Err(not_found("Procedure", id)),
        }
    }

    async fn find_schedule(&self, id: PmScheduleId) -> Result<PmSchedule, PmTrackError> {
        self.schedules
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("PmSchedule", id))
    }

    async fn find_execution(&self, id: PmExecutionId) -> Result<PmExecution, PmTrackError> {
        self.executions
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("PmExecution", id))
    }

    async fn check_topic(&self, id: TopicId) -> Result<(), PmTrackError> {
        match self.topics.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("Topic", id)),
        }
    }

    async fn check_user(&self, id: UserId) -> Result<(), PmTrackError> {
        match self.users.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(not_found("User", id)),
        }
    }

    async fn check_references(
        &self,
        machine_id: MachineId,
        procedure_id: ProcedureId,
        user_id: UserId,
    ) -> Result<(), PmTrackError> {
        if self.machines.get_by_id(machine_id).await?.is_none() {
            return Err(not_found("Machine", machine_id));
        }
        if self.procedures.get_by_id(procedure_id).await?.is_none() {
            return Err(not_found("Procedure", procedure_id));
        }
        self.check_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemory, InMemoryExecutions, actor, user};
    use pmtrack_domain::id::RoomId;
    use pmtrack_domain::machine::Machine;
    use pmtrack_domain::pm_schedule::{FrequencyType, PmStatus};
    use pmtrack_domain::time::Timestamp;
    use pmtrack_domain::topic::Topic;
    use pmtrack_domain::user::{User, UserRole};

    type TestMaintenance = MaintenanceService<
        InMemory<Procedure>,
        InMemory<PmSchedule>,
        InMemoryExecutions,
        InMemory<Topic>,
        InMemory<Machine>,
        InMemory<User>,
    >;

    struct Fixture {
        service: TestMaintenance,
        schedules: InMemory<PmSchedule>,
        supervisor: User,
        technician: User,
        topic: Topic,
        machine: Machine,
    }

    fn setup() -> Fixture {
        let supervisor = user("supervisor", UserRole::Supervisor);
        let technician = user("tech", UserRole::Technician);
        let topic = Topic::new("HVAC", None).unwrap();
        let machine = Machine::builder()
            .room_id(RoomId::new())
            .name("Air handler")
            .build()
            .unwrap();
        let schedules = InMemory::default();
        let executions = InMemoryExecutions {
            executions: InMemory::default(),
            schedules: schedules.clone(),
        };
        let service = MaintenanceService::new(
            InMemory::default(),
            schedules.clone(),
            executions,
            InMemory::with([topic.clone()]),
            InMemory::with([machine.clone()]),
            InMemory::with([supervisor.clone(), technician.clone()]),
        );
        Fixture {
            service,
            schedules,
            supervisor,
            technician,
            topic,
            machine,
        }
    }

    async fn procedure(fixture: &Fixture) -> Procedure {
        let procedure = Procedure::builder()
            .topic_id(fixture.topic.id)
            .title("Replace filter")
            .build()
            .unwrap();
        fixture
            .service
            .create_procedure(&actor(&fixture.supervisor), procedure)
            .await
            .unwrap()
    }

    async fn schedule(fixture: &Fixture, next_due: Timestamp) -> PmSchedule {
        let procedure = procedure(fixture).await;
        let schedule = PmSchedule::builder()
            .machine_id(fixture.machine.id)
            .procedure_id(procedure.id)
            .user_id(fixture.technician.id)
            .frequency(FrequencyType::Weekly)
            .frequency_value(2)
            .next_due(Some(next_due))
            .build()
            .unwrap();
        fixture
            .service
            .create_schedule(&actor(&fixture.supervisor), schedule)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn should_hide_procedure_from_other_topic() {
        let fixture = setup();
        let created = procedure(&fixture).await;
        let boss = actor(&fixture.supervisor);
        let result = fixture
            .service
            .get_procedure(&boss, TopicId::new(), created.id)
            .await;
        assert!(matches!(result, Err(PmTrackError::NotFound(_))));
        fixture
            .service
            .delete_procedure(&boss, fixture.topic.id, created.id)
            .await
            .unwrap();
        let active = fixture
            .service
            .list_procedures(&boss, fixture.topic.id, Some(true))
            .await
            .unwrap();
        assert!(active.is_empty());
    }

    #[tokio::test]
    async fn should_reject_schedule_for_unknown_machine() {
        let fixture = setup();
        let procedure = procedure(&fixture).await;
        let schedule = PmSchedule::builder()
            .machine_id(MachineId::new())
            .procedure_id(procedure.id)
            .user_id(fixture.technician.id)
            .frequency(FrequencyType::Daily)
            .build()
            .unwrap();
        let result = fixture
            .service
            .create_schedule(&actor(&fixture.supervisor), schedule)
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::NotFound(NotFoundError { entity: "Machine", .. }))
        ));
    }

    #[tokio::test]
    async fn should_forbid_technician_from_creating_schedule() {
        let fixture = setup();
        let procedure = procedure(&fixture).await;
        let schedule = PmSchedule::builder()
            .machine_id(fixture.machine.id)
            .procedure_id(procedure.id)
            .user_id(fixture.technician.id)
            .frequency(FrequencyType::Daily)
            .build()
            .unwrap();
        let result = fixture
            .service
            .create_schedule(&actor(&fixture.technician), schedule)
            .await;
        assert!(matches!(result, Err(PmTrackError::Forbidden(_))));
    }

    #[tokio::test]
    async fn should_reschedule_when_execution_completes() {
        let fixture = setup();
        let created = schedule(&fixture, now() - Duration::days(3)).await;
        let tech = actor(&fixture.technician);
        let execution = fixture
            .service
            .create_execution(
                &tech,
                PmExecution::new(created.id, fixture.technician.id, PmStatus::InProgress, None),
            )
            .await
            .unwrap();
        assert!(execution.next_due_calculated.is_none());
        assert_eq!(fixture.service.overdue(&tech).await.unwrap().len(), 1);

        let done = fixture
            .service
            .update_execution(
                &tech,
                execution.id,
                PmExecutionPatch {
                    status: Some(PmStatus::Completed),
                    ..PmExecutionPatch::default()
                },
            )
            .await
            .unwrap();
        let completed_at = done.completed_at.unwrap();
        let expected = completed_at + Duration::days(14);
        assert_eq!(done.next_due_calculated, Some(expected));

        let stored = fixture.schedules.snapshot().remove(0);
        assert_eq!(stored.last_completed, Some(completed_at));
        assert_eq!(stored.next_due, expected);
        assert!(fixture.service.overdue(&tech).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_reschedule_execution_created_completed() {
        let fixture = setup();
        let created = schedule(&fixture, now()).await;
        let tech = actor(&fixture.technician);
        let done = fixture
            .service
            .create_execution(
                &tech,
                PmExecution::new(created.id, fixture.technician.id, PmStatus::Completed, None),
            )
            .await
            .unwrap();
        assert!(done.next_due_calculated.is_some());
        let summary = fixture.service.summary(&tech).await.unwrap();
        assert_eq!(summary.total_schedules, 1);
        assert_eq!(summary.total_executions, 1);
        assert_eq!(summary.completed_executions, 1);
        assert_eq!(summary.overdue_schedules, 0);
    }

    #[tokio::test]
    async fn should_list_upcoming_within_window() {
        let fixture = setup();
        let soon = schedule(&fixture, now() + Duration::days(2)).await;
        schedule(&fixture, now() + Duration::days(20)).await;
        let tech = actor(&fixture.technician);
        let upcoming = fixture.service.upcoming(&tech, 7).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].id, soon.id);

        let result = fixture.service.upcoming(&tech, -1).await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::OutOfRange { field: "days", .. }))
        ));
    }

    #[tokio::test]
    async fn should_reject_execution_of_unknown_schedule() {
        let fixture = setup();
        let result = fixture
            .service
            .create_execution(
                &actor(&fixture.technician),
                PmExecution::new(PmScheduleId::new(), fixture.technician.id, PmStatus::Scheduled, None),
            )
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::NotFound(NotFoundError { entity: "PmSchedule", .. }))
        ));
    }
}
