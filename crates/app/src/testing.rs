//! In-memory port implementations shared by the service tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use pmtrack_domain::access::Actor;
use pmtrack_domain::assignment::JobUserAssignment;
use pmtrack_domain::error::{AuthError, PmTrackError};
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
use pmtrack_domain::session::{IssuedToken, TokenClaims};
use pmtrack_domain::time::now;
use pmtrack_domain::topic::Topic;
use pmtrack_domain::user::{User, UserRole};
use pmtrack_domain::work_order::{WorkOrder, WorkOrderFilter};

use crate::ports::{
    AssignmentRepository, InspectionRepository, IssueRepository, JobRepository,
    MachineRepository, PasswordHasher, PmExecutionRepository, PmScheduleRepository,
    ProcedureRepository, PropertyRepository, RoomRepository, TokenCodec, TopicRepository,
    UserRepository, WorkOrderRepository,
};

/// Shared, cloneable record store kept in insertion order.
#[derive(Debug)]
pub(crate) struct InMemory<T> {
    items: Arc<Mutex<Vec<T>>>,
}

impl<T> Clone for InMemory<T> {
    fn clone(&self) -> Self {
        Self {
            items: Arc::clone(&self.items),
        }
    }
}

impl<T> Default for InMemory<T> {
    fn default() -> Self {
        Self {
            items: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone> InMemory<T> {
    pub(crate) fn with(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items.into_iter().collect())),
        }
    }

    pub(crate) fn snapshot(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    fn insert(&self, item: T) -> T {
        self.items.lock().unwrap().push(item.clone());
        item
    }

    fn find(&self, pred: impl Fn(&T) -> bool) -> Option<T> {
        self.items.lock().unwrap().iter().find(|item| pred(item)).cloned()
    }

    fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.items
            .lock()
            .unwrap()
            .iter()
            .filter(|item| pred(item))
            .cloned()
            .collect()
    }

    fn replace(&self, pred: impl Fn(&T) -> bool, item: T) -> T {
        let mut items = self.items.lock().unwrap();
        if let Some(slot) = items.iter_mut().find(|existing| pred(existing)) {
            *slot = item.clone();
        }
        item
    }

    fn remove(&self, pred: impl Fn(&T) -> bool) {
        self.items.lock().unwrap().retain(|item| !pred(item));
    }
}

impl UserRepository for InMemory<User> {
    fn create(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send {
        let user = self.insert(user);
        async { Ok(user) }
    }

    fn get_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let result = self.find(|user| user.id == id);
        async { Ok(result) }
    }

    fn find_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let result = self.find(|user| user.username == username);
        async { Ok(result) }
    }

    fn find_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<User>, PmTrackError>> + Send {
        let result = self.find(|user| user.email == email);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<User>, PmTrackError>> + Send {
        let mut result = self.snapshot();
        result.sort_by(|a, b| a.username.cmp(&b.username));
        async { Ok(result) }
    }

    fn update(&self, user: User) -> impl Future<Output = Result<User, PmTrackError>> + Send {
        let id = user.id;
        let user = self.replace(|existing| existing.id == id, user);
        async { Ok(user) }
    }
}

impl PropertyRepository for InMemory<Property> {
    fn create(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send {
        let property = self.insert(property);
        async { Ok(property) }
    }

    fn get_by_id(
        &self,
        id: PropertyId,
    ) -> impl Future<Output = Result<Option<Property>, PmTrackError>> + Send {
        let result = self.find(|property| property.id == id);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Property>, PmTrackError>> + Send {
        let result = self.snapshot();
        async { Ok(result) }
    }

    fn update(
        &self,
        property: Property,
    ) -> impl Future<Output = Result<Property, PmTrackError>> + Send {
        let id = property.id;
        let property = self.replace(|existing| existing.id == id, property);
        async { Ok(property) }
    }
}

impl RoomRepository for InMemory<Room> {
    fn create(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send {
        let room = self.insert(room);
        async { Ok(room) }
    }

    fn get_by_id(
        &self,
        id: RoomId,
    ) -> impl Future<Output = Result<Option<Room>, PmTrackError>> + Send {
        let result = self.find(|room| room.id == id);
        async { Ok(result) }
    }

    fn find_by_property(
        &self,
        property_id: PropertyId,
    ) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send {
        let result = self.filter(|room| room.property_id == property_id);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Room>, PmTrackError>> + Send {
        let result = self.snapshot();
        async { Ok(result) }
    }

    fn update(&self, room: Room) -> impl Future<Output = Result<Room, PmTrackError>> + Send {
        let id = room.id;
        let room = self.replace(|existing| existing.id == id, room);
        async { Ok(room) }
    }
}

impl MachineRepository for InMemory<Machine> {
    fn create(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send {
        let machine = self.insert(machine);
        async { Ok(machine) }
    }

    fn get_by_id(
        &self,
        id: MachineId,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send {
        let result = self.find(|machine| machine.id == id);
        async { Ok(result) }
    }

    fn find_by_room(
        &self,
        room_id: RoomId,
    ) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send {
        let result = self.filter(|machine| machine.room_id == room_id);
        async { Ok(result) }
    }

    fn find_by_serial_number(
        &self,
        serial_number: &str,
    ) -> impl Future<Output = Result<Option<Machine>, PmTrackError>> + Send {
        let result = self.find(|machine| machine.serial_number.as_deref() == Some(serial_number));
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Machine>, PmTrackError>> + Send {
        let result = self.snapshot();
        async { Ok(result) }
    }

    fn update(
        &self,
        machine: Machine,
    ) -> impl Future<Output = Result<Machine, PmTrackError>> + Send {
        let id = machine.id;
        let machine = self.replace(|existing| existing.id == id, machine);
        async { Ok(machine) }
    }
}

impl TopicRepository for InMemory<Topic> {
    fn create(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send {
        let topic = self.insert(topic);
        async { Ok(topic) }
    }

    fn get_by_id(
        &self,
        id: TopicId,
    ) -> impl Future<Output = Result<Option<Topic>, PmTrackError>> + Send {
        let result = self.find(|topic| topic.id == id);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Topic>, PmTrackError>> + Send {
        let result = self.snapshot();
        async { Ok(result) }
    }

    fn update(&self, topic: Topic) -> impl Future<Output = Result<Topic, PmTrackError>> + Send {
        let id = topic.id;
        let topic = self.replace(|existing| existing.id == id, topic);
        async { Ok(topic) }
    }
}

/// Apply `page` to an already ordered vector, like `LIMIT ? OFFSET ?`.
fn window<T>(page: Page, items: Vec<T>) -> Vec<T> {
    items
        .into_iter()
        .skip(page.skip as usize)
        .take(page.limit as usize)
        .collect()
}

/// Jobs store that can see the assignment table, like the SQL join does.
#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryJobs {
    pub(crate) jobs: InMemory<Job>,
    pub(crate) assignments: InMemory<JobUserAssignment>,
}

impl JobRepository for InMemoryJobs {
    fn create(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send {
        let job = self.jobs.insert(job);
        async { Ok(job) }
    }

    fn get_by_id(
        &self,
        id: JobId,
    ) -> impl Future<Output = Result<Option<Job>, PmTrackError>> + Send {
        let result = self.jobs.find(|job| job.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &JobFilter,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Job>, PmTrackError>> + Send {
        let active = self.assignments.filter(|assignment| assignment.is_active);
        let mut result = self.jobs.filter(|job| {
            filter.matches_fields(job)
                && filter.assigned_user_id.is_none_or(|user_id| {
                    active
                        .iter()
                        .any(|a| a.job_id == job.id && a.user_id == user_id)
                })
        });
        result.reverse();
        let result = window(page, result);
        async { Ok(result) }
    }

    fn update(&self, job: Job) -> impl Future<Output = Result<Job, PmTrackError>> + Send {
        let id = job.id;
        let job = self.jobs.replace(|existing| existing.id == id, job);
        async { Ok(job) }
    }

    fn delete(&self, id: JobId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        self.assignments.remove(|assignment| assignment.job_id == id);
        self.jobs.remove(|job| job.id == id);
        async { Ok(()) }
    }
}

impl AssignmentRepository for InMemory<JobUserAssignment> {
    fn create(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send {
        let assignment = self.insert(assignment);
        async { Ok(assignment) }
    }

    fn get_by_id(
        &self,
        id: AssignmentId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send {
        let result = self.find(|assignment| assignment.id == id);
        async { Ok(result) }
    }

    fn find_by_job(
        &self,
        job_id: JobId,
    ) -> impl Future<Output = Result<Vec<JobUserAssignment>, PmTrackError>> + Send {
        let mut result = self.filter(|assignment| assignment.job_id == job_id);
        result.reverse();
        async { Ok(result) }
    }

    fn find_active(
        &self,
        job_id: JobId,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<JobUserAssignment>, PmTrackError>> + Send {
        let result = self.find(|assignment| {
            assignment.is_active && assignment.job_id == job_id && assignment.user_id == user_id
        });
        async { Ok(result) }
    }

    fn update(
        &self,
        assignment: JobUserAssignment,
    ) -> impl Future<Output = Result<JobUserAssignment, PmTrackError>> + Send {
        let id = assignment.id;
        let assignment = self.replace(|existing| existing.id == id, assignment);
        async { Ok(assignment) }
    }
}

impl WorkOrderRepository for InMemory<WorkOrder> {
    fn create(
        &self,
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send {
        let order = self.insert(order);
        async { Ok(order) }
    }

    fn get_by_id(
        &self,
        id: WorkOrderId,
    ) -> impl Future<Output = Result<Option<WorkOrder>, PmTrackError>> + Send {
        let result = self.find(|order| order.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &WorkOrderFilter,
    ) -> impl Future<Output = Result<Vec<WorkOrder>, PmTrackError>> + Send {
        let mut result = self.filter(|order| filter.matches(order));
        result.reverse();
        async { Ok(result) }
    }

    fn update(
        &self,
        order: WorkOrder,
    ) -> impl Future<Output = Result<WorkOrder, PmTrackError>> + Send {
        let id = order.id;
        let order = self.replace(|existing| existing.id == id, order);
        async { Ok(order) }
    }
}

impl InspectionRepository for InMemory<Inspection> {
    fn create(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send {
        let inspection = self.insert(inspection);
        async { Ok(inspection) }
    }

    fn get_by_id(
        &self,
        id: InspectionId,
    ) -> impl Future<Output = Result<Option<Inspection>, PmTrackError>> + Send {
        let result = self.find(|inspection| inspection.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &InspectionFilter,
    ) -> impl Future<Output = Result<Vec<Inspection>, PmTrackError>> + Send {
        let mut result = self.filter(|inspection| filter.matches(inspection));
        result.sort_by(|a, b| b.inspection_date.cmp(&a.inspection_date));
        async { Ok(result) }
    }

    fn update(
        &self,
        inspection: Inspection,
    ) -> impl Future<Output = Result<Inspection, PmTrackError>> + Send {
        let id = inspection.id;
        let inspection = self.replace(|existing| existing.id == id, inspection);
        async { Ok(inspection) }
    }

    fn delete(&self, id: InspectionId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        self.remove(|inspection| inspection.id == id);
        async { Ok(()) }
    }
}

impl ProcedureRepository for InMemory<Procedure> {
    fn create(
        &self,
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send {
        let procedure = self.insert(procedure);
        async { Ok(procedure) }
    }

    fn get_by_id(
        &self,
        id: ProcedureId,
    ) -> impl Future<Output = Result<Option<Procedure>, PmTrackError>> + Send {
        let result = self.find(|procedure| procedure.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &ProcedureFilter,
    ) -> impl Future<Output = Result<Vec<Procedure>, PmTrackError>> + Send {
        let mut result = self.filter(|procedure| filter.matches(procedure));
        result.sort_by(|a, b| a.title.cmp(&b.title));
        async { Ok(result) }
    }

    fn update(
        &self,
        procedure: Procedure,
    ) -> impl Future<Output = Result<Procedure, PmTrackError>> + Send {
        let id = procedure.id;
        let procedure = self.replace(|existing| existing.id == id, procedure);
        async { Ok(procedure) }
    }
}

impl PmScheduleRepository for InMemory<PmSchedule> {
    fn create(
        &self,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send {
        let schedule = self.insert(schedule);
        async { Ok(schedule) }
    }

    fn get_by_id(
        &self,
        id: PmScheduleId,
    ) -> impl Future<Output = Result<Option<PmSchedule>, PmTrackError>> + Send {
        let result = self.find(|schedule| schedule.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &PmScheduleFilter,
    ) -> impl Future<Output = Result<Vec<PmSchedule>, PmTrackError>> + Send {
        let mut result = self.filter(|schedule| filter.matches(schedule));
        result.sort_by(|a, b| a.next_due.cmp(&b.next_due));
        async { Ok(result) }
    }

    fn update(
        &self,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<PmSchedule, PmTrackError>> + Send {
        let id = schedule.id;
        let schedule = self.replace(|existing| existing.id == id, schedule);
        async { Ok(schedule) }
    }
}

/// Executions store that writes through to the schedules, like the SQL
/// transaction does.
#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryExecutions {
    pub(crate) executions: InMemory<PmExecution>,
    pub(crate) schedules: InMemory<PmSchedule>,
}

impl PmExecutionRepository for InMemoryExecutions {
    fn create(
        &self,
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send {
        let execution = self.executions.insert(execution);
        async { Ok(execution) }
    }

    fn get_by_id(
        &self,
        id: PmExecutionId,
    ) -> impl Future<Output = Result<Option<PmExecution>, PmTrackError>> + Send {
        let result = self.executions.find(|execution| execution.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &PmExecutionFilter,
    ) -> impl Future<Output = Result<Vec<PmExecution>, PmTrackError>> + Send {
        let mut result = self.executions.filter(|execution| filter.matches(execution));
        result.reverse();
        async { Ok(result) }
    }

    fn update(
        &self,
        execution: PmExecution,
    ) -> impl Future<Output = Result<PmExecution, PmTrackError>> + Send {
        let id = execution.id;
        let execution = self.executions.replace(|existing| existing.id == id, execution);
        async { Ok(execution) }
    }

    fn complete(
        &self,
        execution: PmExecution,
        schedule: PmSchedule,
    ) -> impl Future<Output = Result<(PmExecution, PmSchedule), PmTrackError>> + Send {
        let id = execution.id;
        let execution = if self.executions.find(|existing| existing.id == id).is_some() {
            self.executions.replace(|existing| existing.id == id, execution)
        } else {
            self.executions.insert(execution)
        };
        let schedule_id = schedule.id;
        let schedule = self
            .schedules
            .replace(|existing| existing.id == schedule_id, schedule);
        async { Ok((execution, schedule)) }
    }

    fn delete(
        &self,
        id: PmExecutionId,
    ) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        self.executions.remove(|execution| execution.id == id);
        async { Ok(()) }
    }
}

impl IssueRepository for InMemory<Issue> {
    fn create(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send {
        let issue = self.insert(issue);
        async { Ok(issue) }
    }

    fn get_by_id(
        &self,
        id: IssueId,
    ) -> impl Future<Output = Result<Option<Issue>, PmTrackError>> + Send {
        let result = self.find(|issue| issue.id == id);
        async { Ok(result) }
    }

    fn list(
        &self,
        filter: &IssueFilter,
    ) -> impl Future<Output = Result<Vec<Issue>, PmTrackError>> + Send {
        let mut result = self.filter(|issue| filter.matches(issue));
        result.sort_by(|a, b| b.reported_at.cmp(&a.reported_at));
        async { Ok(result) }
    }

    fn update(&self, issue: Issue) -> impl Future<Output = Result<Issue, PmTrackError>> + Send {
        let id = issue.id;
        let issue = self.replace(|existing| existing.id == id, issue);
        async { Ok(issue) }
    }

    fn delete(&self, id: IssueId) -> impl Future<Output = Result<(), PmTrackError>> + Send {
        self.remove(|issue| issue.id == id);
        async { Ok(()) }
    }
}

/// Reversible "hash" so tests can tell hashed from plain text.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct PlainHasher;

impl PasswordHasher for PlainHasher {
    fn hash(&self, password: &str) -> Result<String, PmTrackError> {
        Ok(format!("hashed:{password}"))
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, PmTrackError> {
        Ok(hash.strip_prefix("hashed:") == Some(password))
    }
}

/// Unsigned `token:<user>:<jti>` tokens valid for thirty minutes.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct FakeTokens;

impl TokenCodec for FakeTokens {
    fn issue(&self, user: &User) -> Result<IssuedToken, PmTrackError> {
        let jti = uuid_like();
        Ok(IssuedToken {
            token: format!("token:{}:{jti}:{}", user.id, user.role),
            jti,
            expires_at: now() + Duration::minutes(30),
        })
    }

    fn decode(&self, token: &str) -> Result<TokenClaims, PmTrackError> {
        let mut parts = token.split(':');
        let (Some("token"), Some(user_id), Some(jti), Some(role)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::InvalidToken.into());
        };
        let user_id = user_id
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)?;
        let role = role.parse::<UserRole>().map_err(|_| AuthError::InvalidToken)?;
        let issued_at = now();
        Ok(TokenClaims {
            user_id,
            jti: jti.to_string(),
            role,
            issued_at,
            expires_at: issued_at + Duration::minutes(30),
        })
    }
}

fn uuid_like() -> String {
    JobId::new().to_string()
}

pub(crate) fn user(username: &str, role: UserRole) -> User {
    User::builder()
        .username(username)
        .email(format!("{username}@example.com"))
        .first_name("Test")
        .last_name(username)
        .role(role)
        .password_hash("hashed:secret1")
        .build()
        .unwrap()
}

pub(crate) fn actor(user: &User) -> Actor {
    Actor::from_user(user)
}
