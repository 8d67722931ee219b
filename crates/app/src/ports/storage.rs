//! Storage port: repository traits for persistence.
//!
//! Listing methods return records in the order the API exposes them, so
//! services never re-sort.

use std::future::Future;

use pmtrack_domain::assignment::JobUserAssignment;
use pmtrack_domain::error::PmTrackError;
use pmtrack_domain::id::{
    AssignmentId, InspectionId, IssueId, JobId, MachineId, PmExecutionId, PmScheduleId,
    ProcedureId, PropertyId, RoomId, TopicId, UserId, WorkOrderId,
};
use pmtrack_domain::inspection::{Inspection, InspectionFilter};
use pmtrack_domain::issue::{Issue, IssueFilter};
use pmtrack_domain::job::{Job, JobFilter};
use pmtrack_domain::machine::Machine;
use pmtrack_domain::page::Page;
use pmtrack_domain::pm_schedule::{
    PmExecution, PmExecutionFilter, PmSchedule, PmScheduleFilter,
};
use pmtrack_domain::procedure::{Procedure, ProcedureFilter};
use pmtrack_domain::property::Property;
use pmtrack_domain::room::Room;
use pmtrack_domain::topic::Topic;
use pmtrack_domain::user::User;
use pmtrack_domain::work_order::{WorkOrder, WorkOrderFilter};

/// Persistence for [`User`] accounts.
pub trait UserRepository {
    fn create(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send;

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send;

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send;

    /// All users, active or not, ordered by username.
    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, PmTrackError>> + Send;

    fn update(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send;
}

/// Persistence for [`Property`] records.
pub trait PropertyRepository {
    fn create(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, PmTrackError>> + Send;

    /// All properties ordered by name.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Property>, PmTrackError>> + Send;

    fn update(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send;
}

/// Persistence for [`Room`] records.
pub trait RoomRepository {
    fn create(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, PmTrackError>> + Send;

    /// Rooms of one property ordered by name.
    fn find_by_property(
        &self,
        property_id: PropertyId,
    ) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send;

    fn update(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send;
}

/// Persistence for [`Machine`] records.
pub trait MachineRepository {
    fn create(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: MachineId,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send;

    /// Machines of one room ordered by name.
    fn find_by_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send;

    fn find_by_serial_number(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send;

    fn update(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send;
}

/// Persistence for [`Topic`] records.
pub trait TopicRepository {
    fn create(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: TopicId,
    ) -> impl Future<Output = Result<Option<Topic>, PmTrackError>> + Send;

    /// All topics ordered by title.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Topic>, PmTrackError>> + Send;

    fn update(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send;
}

/// Persistence for [`Job`] records.
pub trait JobRepository {
    fn create(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send;

    fn get_by_id(&self, id: JobId)
    -> impl Future<Output = Result<Option<Job>, PmTrackError>> + Send;

    /// Jobs matching `filter`, newest first, windowed by `page`.
    fn list(
        &self,
        filter: &JobFilter,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Job>, PmTrackError>> + Send;

    fn update(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send;

    /// Remove the job together with all of its assignments.
    fn delete(&self, id: JobId) -> impl Future<Output = Result<(), PmTrackError>> + Send;
}

/// Persistence for [`JobUserAssignment`] rows.
pub trait AssignmentRepository {
    fn create(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: AssignmentId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send;

    /// Every assignment of a job, active or not, newest first.
    fn find_by_job(
        &self,
        job_id: JobId,
    ) -> impl Future<Output = Result<Vec<JobUserAssignment>, PmTrackError>> + Send;

    /// The active assignment of `user_id` on `job_id`, if any.
    fn find_active(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send;

    fn update(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send;
}

/// Persistence for [`WorkOrder`] records.
pub trait WorkOrderRepository {
    fn create(
        &self,
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: WorkOrderId,
    ) -> impl Future<Output = Result<Option<WorkOrder>, PmTrackError>> + Send;

    /// Work orders matching `filter`, newest first.
    fn list(
        &self,
        filter: &WorkOrderFilter,
    ) -> impl Future<Output = Result<Vec<WorkOrder>, PmTrackError>> + Send;

    fn update(
        &self,
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send;
}

/// Persistence for [`Inspection`] records.
pub trait InspectionRepository {
    fn create(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: InspectionId,
    ) -> impl Future<Output = Result<Option<Inspection>, PmTrackError>> + Send;

    /// Inspections matching `filter`, most recent `inspection_date` first.
    fn list(
        &self,
        filter: &InspectionFilter,
    ) -> impl Future<Output = Result<Vec<Inspection>, PmTrackError>> + Send;

    fn update(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send;

    fn delete(&self, id: InspectionId) -> impl Future<Output = Result<(), PmTrackError>> + Send;
}

/// Persistence for [`Procedure`] records.
pub trait ProcedureRepository {
    fn create(
        &self,
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: ProcedureId,
    ) -> impl Future<Output = Result<Option<Procedure>, PmTrackError>> + Send;

    /// Procedures matching `filter` ordered by title.
    fn list(
        &self,
        filter: &ProcedureFilter,
    ) -> impl Future<Output = Result<Vec<Procedure>, PmTrackError>> + Send;

    fn update(
        &self,
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send;
}

/// Persistence for [`PmSchedule`] records.
pub trait PmScheduleRepository {
    fn create(
        &self,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: PmScheduleId,
    ) -> impl Future<Output = Result<Option<PmSchedule>, PmTrackError>> + Send;

    /// Schedules matching `filter`, soonest `next_due` first.
    fn list(
        &self,
        filter: &PmScheduleFilter,
    ) -> impl Future<Output = Result<Vec<PmSchedule>, PmTrackError>> + Send;

    fn update(
        &self,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send;
}

/// Persistence for [`PmExecution`] records.
pub trait PmExecutionRepository {
    fn create(
        &self,
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: PmExecutionId,
    ) -> impl Future<Output = Result<Option<PmExecution>, PmTrackError>> + Send;

    /// Executions matching `filter`, newest first.
    fn list(
        &self,
        filter: &PmExecutionFilter,
    ) -> impl Future<Output = Result<Vec<PmExecution>, PmTrackError>> + Send;

    fn update(
        &self,
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send;

    /// Store a completed execution and its rescheduled parent together.
    ///
    /// The execution is inserted when it does not exist yet and updated
    /// otherwise.
    fn complete(
        &self,
        execution: PmExecution,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<(PmExecution, PmSchedule), PmTrackError>> + Send;

    fn delete(&self, id: PmExecutionId)
    -> impl Future<Output = Result<(), PmTrackError>> + Send;
}

/// Persistence for [`Issue`] records.
pub trait IssueRepository {
    fn create(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send;

    fn get_by_id(
        &self,
        id: IssueId,
    ) -> impl Future<Output = Result<Option<Issue>, PmTrackError>> + Send;

    /// Issues matching `filter`, most recently reported first.
    fn list(
        &self,
        filter: &IssueFilter,
    ) -> impl Future<Output = Result<Vec<Issue>, PmTrackError>> + Send;

    fn update(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send;

    fn delete(&self, id: IssueId) -> impl Future<Output = Result<(), PmTrackError>> + Send;
}
