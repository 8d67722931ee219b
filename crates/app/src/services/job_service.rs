//! Job service: job lifecycle and multi-user assignment.
//!
//! Supervisors and above manage jobs outright. Technicians may only move a
//! job through its status lifecycle, and only while they hold an active
//! assignment on it.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::assignment::{AssignmentPatch, JobUserAssignment};
use pmtrack_domain::error::{ForbiddenError, NotFoundError, PmTrackError, ValidationError};
use pmtrack_domain::id::{AssignmentId, JobId, PropertyId, RoomId, TopicId, UserId};
use pmtrack_domain::job::{Job, JobFilter, JobPatch, JobStatus};
use pmtrack_domain::page::Page;

use crate::ports::{
    AssignmentRepository, JobRepository, PropertyRepository, RoomRepository, TopicRepository,
    UserRepository,
};

/// A job together with its active assignments.
#[derive(Debug, Clone)]
pub struct JobDetails {
    pub job: Job,
    pub assignments: Vec<JobUserAssignment>,
}

/// Request to put a user on a job.
#[derive(Debug, Clone)]
pub struct NewAssignment {
    pub user_id: UserId,
    pub role_in_job: Option<String>,
    pub notes: Option<String>,
    /// Defaults to the caller.
    pub assigned_by_id: Option<UserId>,
}

fn not_found(entity: &'static str, id: impl ToString) -> PmTrackError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

/// Application service for jobs and their assignments.
pub struct JobService<J, A, U, P, R, T> {
    jobs: J,
    assignments: A,
    users: U,
    properties: P,
    rooms: R,
    topics: T,
}

impl<J, A, U, P, R, T> JobService<J, A, U, P, R, T>
where
    J: JobRepository,
    A: AssignmentRepository,
    U: UserRepository,
    P: PropertyRepository,
    R: RoomRepository,
    T: TopicRepository,
{
    pub fn new(jobs: J, assignments: A, users: U, properties: P, rooms: R, topics: T) -> Self {
        Self {
            jobs,
            assignments,
            users,
            properties,
            rooms,
            topics,
        }
    }

    /// Create a job after checking every reference it carries.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageJobs`,
    /// [`PmTrackError::NotFound`] for a missing property, room, topic or
    /// creator, and [`ValidationError::RoomNotInProperty`] when the room
    /// belongs elsewhere.
    #[tracing::instrument(skip(self, actor, job), fields(actor = %actor.username, job_id = %job.id))]
    pub async fn create_job(&self, actor: &Actor, job: Job) -> Result<Job, PmTrackError> {
        actor.authorize(Permission::ManageJobs)?;
        job.validate()?;
        self.check_location(job.property_id, job.room_id).await?;
        if let Some(topic_id) = job.topic_id {
            self.check_topic(topic_id).await?;
        }
        self.check_user(job.created_by_id).await?;
        let job = self.jobs.create(job).await?;
        tracing::info!(status = %job.status, "job created");
        Ok(job)
    }

    /// List jobs matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_jobs(
        &self,
        actor: &Actor,
        filter: &JobFilter,
        page: Page,
    ) -> Result<Vec<Job>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.jobs.list(filter, page).await
    }

    /// Fetch a job with its active assignments.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown job.
    pub async fn get_job(&self, actor: &Actor, id: JobId) -> Result<JobDetails, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        let job = self.find_job(id).await?;
        let assignments = self
            .assignments
            .find_by_job(id)
            .await?
            .into_iter()
            .filter(|assignment| assignment.is_active)
            .collect();
        Ok(JobDetails { job, assignments })
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] when a technician edits anything
    /// but the status or is not assigned to the job,
    /// [`ValidationError::InvalidJobTransition`] for an illegal status
    /// change, and the same reference errors as [`Self::create_job`].
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_job(
        &self,
        actor: &Actor,
        id: JobId,
        patch: JobPatch,
    ) -> Result<Job, PmTrackError> {
        let mut job = self.find_job(id).await?;
        if !actor.can(Permission::ManageJobs) {
            actor.authorize(Permission::UpdateJobProgress)?;
            if patch.touches_details() {
                return Err(ForbiddenError::StatusOnly.into());
            }
            if self.assignments.find_active(id, actor.user_id).await?.is_none() {
                tracing::warn!("unassigned technician tried to update job");
                return Err(ForbiddenError::NotAssigned.into());
            }
        }

        if patch.property_id.is_some() || patch.room_id.is_some() {
            let property_id = patch.property_id.unwrap_or(job.property_id);
            self.check_location(property_id, patch.room_id.or(job.room_id))
                .await?;
        }
        if let Some(topic_id) = patch.topic_id {
            self.check_topic(topic_id).await?;
        }

        let previous = job.status;
        job.apply(patch)?;
        let job = self.jobs.update(job).await?;
        if job.status != previous {
            tracing::info!(from = %previous, to = %job.status, "job status changed");
        }
        Ok(job)
    }

    /// Change only the status of a job.
    ///
    /// # Errors
    ///
    /// Same as [`Self::update_job`].
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: JobId,
        status: JobStatus,
    ) -> Result<Job, PmTrackError> {
        self.update_job(actor, id, JobPatch::status(status)).await
    }

    /// Remove a job and its whole assignment history.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageJobs` and
    /// [`PmTrackError::NotFound`] for an unknown job.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_job(&self, actor: &Actor, id: JobId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageJobs)?;
        self.find_job(id).await?;
        self.jobs.delete(id).await?;
        tracing::info!("job deleted");
        Ok(())
    }

    /// Put a user on a job.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `AssignJobs`,
    /// [`PmTrackError::NotFound`] for an unknown job, user or assigner, and
    /// [`ValidationError::AlreadyAssigned`] when the user already holds an
    /// active assignment on the job.
    #[tracing::instrument(skip(self, actor, request), fields(actor = %actor.username, user_id = %request.user_id))]
    pub async fn assign_user(
        &self,
        actor: &Actor,
        job_id: JobId,
        request: NewAssignment,
    ) -> Result<JobUserAssignment, PmTrackError> {
        actor.authorize(Permission::AssignJobs)?;
        self.find_job(job_id).await?;
        self.check_user(request.user_id).await?;
        let assigned_by_id = request.assigned_by_id.unwrap_or(actor.user_id);
        if assigned_by_id != actor.user_id {
            self.check_user(assigned_by_id).await?;
        }
        if self
            .assignments
            .find_active(job_id, request.user_id)
            .await?
            .is_some()
        {
            return Err(ValidationError::AlreadyAssigned.into());
        }
        let assignment = JobUserAssignment::new(
            job_id,
            request.user_id,
            assigned_by_id,
            request.role_in_job,
            request.notes,
        )?;
        let assignment = self.assignments.create(assignment).await?;
        tracing::info!(assignment_id = %assignment.id, "user assigned to job");
        Ok(assignment)
    }

    /// Active assignments of a job.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown job.
    pub async fn list_assignments(
        &self,
        actor: &Actor,
        job_id: JobId,
    ) -> Result<Vec<JobUserAssignment>, PmTrackError> {
        Ok(self.get_job(actor, job_id).await?.assignments)
    }

    /// Every assignment a job ever had, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown job.
    pub async fn job_history(
        &self,
        actor: &Actor,
        job_id: JobId,
    ) -> Result<Vec<JobUserAssignment>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find_job(job_id).await?;
        self.assignments.find_by_job(job_id).await
    }

    /// Edit an assignment's role, notes or active flag.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown assignment and
    /// [`ValidationError::AlreadyAssigned`] when re-activating it would
    /// duplicate another active assignment.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_assignment(
        &self,
        actor: &Actor,
        id: AssignmentId,
        patch: AssignmentPatch,
    ) -> Result<JobUserAssignment, PmTrackError> {
        actor.authorize(Permission::AssignJobs)?;
        let mut assignment = self.find_assignment(id).await?;
        if patch.is_active == Some(true)
            && !assignment.is_active
            && self
                .assignments
                .find_active(assignment.job_id, assignment.user_id)
                .await?
                .is_some()
        {
            return Err(ValidationError::AlreadyAssigned.into());
        }
        assignment.apply(patch)?;
        self.assignments.update(assignment).await
    }

    /// Deactivate an assignment, keeping it in the job's history.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown assignment.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn remove_assignment(
        &self,
        actor: &Actor,
        id: AssignmentId,
    ) -> Result<(), PmTrackError> {
        actor.authorize(Permission::AssignJobs)?;
        let mut assignment = self.find_assignment(id).await?;
        assignment.is_active = false;
        self.assignments.update(assignment).await?;
        tracing::info!("assignment removed");
        Ok(())
    }

    /// Jobs a user is actively assigned to, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown user.
    pub async fn jobs_for_user(
        &self,
        actor: &Actor,
        user_id: UserId,
        status: Option<JobStatus>,
        page: Page,
    ) -> Result<Vec<Job>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.check_user(user_id).await?;
        let filter = JobFilter {
            status,
            assigned_user_id: Some(user_id),
            ..JobFilter::default()
        };
        self.jobs.list(&filter, page).await
    }

    /// Number of jobs in each status, in lifecycle order.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ViewStatistics`.
    pub async fn status_counts(&self, actor: &Actor) -> Result<Vec<(JobStatus, u64)>, PmTrackError> {
        actor.authorize(Permission::ViewStatistics)?;
        let everything = Page {
            skip: 0,
            limit: u32::MAX,
        };
        let jobs = self.jobs.list(&JobFilter::default(), everything).await?;
        Ok(JobStatus::ALL
            .iter()
            .map(|status| {
                let count = jobs.iter().filter(|job| job.status == *status).count();
                (*status, count as u64)
            })
            .collect())
    }

    async fn find_job(&self, id: JobId) -> Result<Job, PmTrackError> {
        self.jobs
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Job", id))
    }

    async fn find_assignment(&self, id: AssignmentId) -> Result<JobUserAssignment, PmTrackError> {
        self.assignments
            .get_by_id(id)
            .await?
            .ok_or_else(|| not_found("Assignment", id))
    }

    async fn check_user(&self, id: UserId) -> Result<(), PmTrackError> {
        self.users
            .get_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| not_found("User", id))
    }

    async fn check_topic(&self, id: TopicId) -> Result<(), PmTrackError> {
        self.topics
            .get_by_id(id)
            .await?
            .map(|_| ())
            .ok_or_else(|| not_found("Topic", id))
    }

    async fn check_location(
        &self,
        property_id: PropertyId,
        room_id: Option<RoomId>,
    ) -> Result<(), PmTrackError> {
        if self.properties.get_by_id(property_id).await?.is_none() {
            return Err(not_found("Property", property_id));
        }
        if let Some(room_id) = room_id {
            let room = self
                .rooms
                .get_by_id(room_id)
                .await?
                .ok_or_else(|| not_found("Room", room_id))?;
            if room.property_id != property_id {
                return Err(ValidationError::RoomNotInProperty.into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemory, InMemoryJobs, actor, user};
    use pmtrack_domain::property::Property;
    use pmtrack_domain::room::Room;
    use pmtrack_domain::topic::Topic;
    use pmtrack_domain::user::{User, UserRole};

    type TestJobs = JobService<
        InMemoryJobs,
        InMemory<JobUserAssignment>,
        InMemory<User>,
        InMemory<Property>,
        InMemory<Room>,
        InMemory<Topic>,
    >;

    struct Fixture {
        service: TestJobs,
        store: InMemoryJobs,
        supervisor: User,
        technician: User,
        property: Property,
        room: Room,
        other_room: Room,
    }

    fn fixture() -> Fixture {
        let supervisor = user("supervisor", UserRole::Supervisor);
        let technician = user("technician", UserRole::Technician);
        let property = Property::builder().name("HQ").build().unwrap();
        let other = Property::builder().name("Annex").build().unwrap();
        let room = Room::builder()
            .property_id(property.id)
            .name("Boiler room")
            .build()
            .unwrap();
        let other_room = Room::builder()
            .property_id(other.id)
            .name("Annex lobby")
            .build()
            .unwrap();
        let store = InMemoryJobs::default();
        let service = JobService::new(
            store.clone(),
            store.assignments.clone(),
            InMemory::with([supervisor.clone(), technician.clone()]),
            InMemory::with([property.clone(), other]),
            InMemory::with([room.clone(), other_room.clone()]),
            InMemory::default(),
        );
        Fixture {
            service,
            store,
            supervisor,
            technician,
            property,
            room,
            other_room,
        }
    }

    impl Fixture {
        fn job(&self) -> Job {
            Job::builder()
                .title("Descale boiler")
                .property_id(self.property.id)
                .room_id(Some(self.room.id))
                .created_by_id(self.supervisor.id)
                .build()
                .unwrap()
        }

        async fn created_job(&self) -> Job {
            self.service
                .create_job(&actor(&self.supervisor), self.job())
                .await
                .unwrap()
        }

        async fn assign_technician(&self, job: &Job) -> JobUserAssignment {
            self.service
                .assign_user(
                    &actor(&self.supervisor),
                    job.id,
                    NewAssignment {
                        user_id: self.technician.id,
                        role_in_job: None,
                        notes: None,
                        assigned_by_id: None,
                    },
                )
                .await
                .unwrap()
        }
    }

    #[tokio::test]
    async fn should_create_job_when_references_exist() {
        let fx = fixture();
        let job = fx.created_job().await;
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(fx.store.jobs.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn should_forbid_technician_from_creating_job() {
        let fx = fixture();
        let result = fx.service.create_job(&actor(&fx.technician), fx.job()).await;
        assert!(matches!(result, Err(PmTrackError::Forbidden(_))));
    }

    #[tokio::test]
    async fn should_reject_room_from_another_property() {
        let fx = fixture();
        let mut job = fx.job();
        job.room_id = Some(fx.other_room.id);
        let result = fx.service.create_job(&actor(&fx.supervisor), job).await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::RoomNotInProperty))
        ));
    }

    #[tokio::test]
    async fn should_reject_unknown_topic() {
        let fx = fixture();
        let mut job = fx.job();
        job.topic_id = Some(TopicId::new());
        let result = fx.service.create_job(&actor(&fx.supervisor), job).await;
        assert!(matches!(
            result,
            Err(PmTrackError::NotFound(NotFoundError { entity: "Topic", .. }))
        ));
    }

    #[tokio::test]
    async fn should_reject_room_change_outside_property() {
        let fx = fixture();
        let job = fx.created_job().await;
        let result = fx
            .service
            .update_job(
                &actor(&fx.supervisor),
                job.id,
                JobPatch {
                    room_id: Some(fx.other_room.id),
                    ..JobPatch::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::RoomNotInProperty))
        ));
    }

    #[tokio::test]
    async fn should_reject_second_active_assignment_for_same_user() {
        let fx = fixture();
        let job = fx.created_job().await;
        fx.assign_technician(&job).await;
        let result = fx
            .service
            .assign_user(
                &actor(&fx.supervisor),
                job.id,
                NewAssignment {
                    user_id: fx.technician.id,
                    role_in_job: Some("HELPER".to_string()),
                    notes: None,
                    assigned_by_id: None,
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::AlreadyAssigned))
        ));
    }

    #[tokio::test]
    async fn should_allow_reassignment_after_removal_and_keep_history() {
        let fx = fixture();
        let job = fx.created_job().await;
        let first = fx.assign_technician(&job).await;
        assert_eq!(first.assigned_by_id, fx.supervisor.id);
        assert_eq!(first.role_in_job, "ASSIGNEE");

        fx.service
            .remove_assignment(&actor(&fx.supervisor), first.id)
            .await
            .unwrap();
        fx.assign_technician(&job).await;

        let active = fx
            .service
            .list_assignments(&actor(&fx.supervisor), job.id)
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        let history = fx
            .service
            .job_history(&actor(&fx.supervisor), job.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].is_active);
        assert!(!history[1].is_active);
    }

    #[tokio::test]
    async fn should_reject_reactivating_duplicate_assignment() {
        let fx = fixture();
        let job = fx.created_job().await;
        let first = fx.assign_technician(&job).await;
        fx.service
            .remove_assignment(&actor(&fx.supervisor), first.id)
            .await
            .unwrap();
        fx.assign_technician(&job).await;

        let result = fx
            .service
            .update_assignment(
                &actor(&fx.supervisor),
                first.id,
                AssignmentPatch {
                    is_active: Some(true),
                    ..AssignmentPatch::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::AlreadyAssigned))
        ));
    }

    #[tokio::test]
    async fn should_let_assigned_technician_progress_job() {
        let fx = fixture();
        let job = fx.created_job().await;
        fx.assign_technician(&job).await;
        let tech = actor(&fx.technician);

        let started = fx
            .service
            .set_status(&tech, job.id, JobStatus::InProgress)
            .await
            .unwrap();
        assert!(started.started_at.is_some());

        let done = fx
            .service
            .set_status(&tech, job.id, JobStatus::Completed)
            .await
            .unwrap();
        assert!(done.completed_at.is_some());
    }

    #[tokio::test]
    async fn should_forbid_unassigned_technician() {
        let fx = fixture();
        let job = fx.created_job().await;
        let result = fx
            .service
            .set_status(&actor(&fx.technician), job.id, JobStatus::InProgress)
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Forbidden(ForbiddenError::NotAssigned))
        ));
    }

    #[tokio::test]
    async fn should_forbid_technician_editing_details() {
        let fx = fixture();
        let job = fx.created_job().await;
        fx.assign_technician(&job).await;
        let result = fx
            .service
            .update_job(
                &actor(&fx.technician),
                job.id,
                JobPatch {
                    title: Some("Renamed".to_string()),
                    ..JobPatch::default()
                },
            )
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Forbidden(ForbiddenError::StatusOnly))
        ));
    }

    #[tokio::test]
    async fn should_reject_illegal_transition() {
        let fx = fixture();
        let job = fx.created_job().await;
        let result = fx
            .service
            .set_status(&actor(&fx.supervisor), job.id, JobStatus::Completed)
            .await;
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(
                ValidationError::InvalidJobTransition { .. }
            ))
        ));
        let stored = fx.store.jobs.snapshot();
        assert_eq!(stored[0].status, JobStatus::Pending);
    }

    #[tokio::test]
    async fn should_delete_job_with_assignments() {
        let fx = fixture();
        let job = fx.created_job().await;
        fx.assign_technician(&job).await;
        fx.service
            .delete_job(&actor(&fx.supervisor), job.id)
            .await
            .unwrap();
        assert!(fx.store.jobs.snapshot().is_empty());
        assert!(fx.store.assignments.snapshot().is_empty());
    }

    #[tokio::test]
    async fn should_list_jobs_assigned_to_user() {
        let fx = fixture();
        let assigned = fx.created_job().await;
        fx.created_job().await;
        fx.assign_technician(&assigned).await;

        let jobs = fx
            .service
            .jobs_for_user(&actor(&fx.technician), fx.technician.id, None, Page::default())
            .await
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, assigned.id);

        let none = fx
            .service
            .jobs_for_user(
                &actor(&fx.technician),
                fx.technician.id,
                Some(JobStatus::Completed),
                Page::default(),
            )
            .await
            .unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn should_return_job_with_active_assignments() {
        let fx = fixture();
        let job = fx.created_job().await;
        fx.assign_technician(&job).await;
        let details = fx
            .service
            .get_job(&actor(&fx.technician), job.id)
            .await
            .unwrap();
        assert_eq!(details.job.id, job.id);
        assert_eq!(details.assignments.len(), 1);
    }

    #[tokio::test]
    async fn should_count_jobs_per_status_for_managers() {
        let fx = fixture();
        fx.created_job().await;
        let manager = actor(&user("manager", UserRole::Manager));
        let counts = fx.service.status_counts(&manager).await.unwrap();
        assert_eq!(counts.len(), JobStatus::ALL.len());
        assert_eq!(counts[0], (JobStatus::Pending, 1));
        assert!(fx.service.status_counts(&actor(&fx.supervisor)).await.is_err());
    }
}
