//! Job: a unit of maintenance work with a status lifecycle.
//!
//! ```text
//!   PENDING ⇄ ASSIGNED ──┐
//!      │  ╲      │        ├──► CANCELLED
//!      ▼   ╲     ▼        │
//!   ON_HOLD ⇄ IN_PROGRESS ┴──► COMPLETED
//! ```
//!
//! `COMPLETED` and `CANCELLED` are terminal. Entering `IN_PROGRESS` stamps
//! `started_at` and entering `COMPLETED` stamps `completed_at`, each only once.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{JobId, PropertyId, RoomId, TopicId, UserId};
use crate::priority::Priority;
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Lifecycle state of a [`Job`].
    #[derive(Default)]
    JobStatus {
        #[default]
        Pending => "PENDING",
        Assigned => "ASSIGNED",
        InProgress => "IN_PROGRESS",
        OnHold => "ON_HOLD",
        Completed => "COMPLETED",
        Cancelled => "CANCELLED",
    }
}

impl JobStatus {
    /// Whether a job in this state can move to `next`.
    ///
    /// Staying in the same state is always allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use JobStatus::{Assigned, Cancelled, Completed, InProgress, OnHold, Pending};

        self == next
            || matches!(
                (self, next),
                (Pending, Assigned | InProgress | OnHold | Cancelled)
                    | (Assigned, Pending | InProgress | OnHold | Cancelled)
                    | (InProgress, OnHold | Completed | Cancelled)
                    | (OnHold, Pending | Assigned | InProgress | Cancelled)
            )
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

/// A maintenance job at a property, optionally scoped to a room and topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub title: String,
    pub description: Option<String>,
    pub topic_id: Option<TopicId>,
    pub room_id: Option<RoomId>,
    pub property_id: PropertyId,
    pub status: JobStatus,
    pub created_by_id: UserId,
    pub before_image: Option<String>,
    pub after_image: Option<String>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub priority: Priority,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Job {
    pub const TITLE_MAX: usize = 200;
    pub const IMAGE_MAX: usize = 500;

    /// Create a builder for constructing a [`Job`].
    #[must_use]
    pub fn builder() -> JobBuilder {
        JobBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the title is empty or too
    /// long, an image reference is too long, or hours are negative.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        validate::optional("before_image", self.before_image.as_deref(), Self::IMAGE_MAX)?;
        validate::optional("after_image", self.after_image.as_deref(), Self::IMAGE_MAX)?;
        validate::non_negative("estimated_hours", self.estimated_hours)?;
        validate::non_negative("actual_hours", self.actual_hours)?;
        Ok(())
    }

    /// Move the job to `next`, stamping start and completion times.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidJobTransition`] when the move is
    /// not allowed from the current status.
    pub fn transition_to(&mut self, next: JobStatus, at: Timestamp) -> Result<(), PmTrackError> {
        if self.status == next {
            return Ok(());
        }
        if !self.status.can_transition_to(next) {
            return Err(ValidationError::InvalidJobTransition {
                from: self.status,
                to: next,
            }
            .into());
        }
        self.status = next;
        match next {
            JobStatus::InProgress => {
                self.started_at.get_or_insert(at);
            }
            JobStatus::Completed => {
                self.completed_at.get_or_insert(at);
            }
            _ => {}
        }
        self.updated_at = at;
        Ok(())
    }

    /// Apply a partial update, including any status transition.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the status change is illegal
    /// or the patched job breaks an invariant.
    pub fn apply(&mut self, patch: JobPatch) -> Result<(), PmTrackError> {
        let at = now();
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(topic_id) = patch.topic_id {
            self.topic_id = Some(topic_id);
        }
        if let Some(room_id) = patch.room_id {
            self.room_id = Some(room_id);
        }
        if let Some(property_id) = patch.property_id {
            self.property_id = property_id;
        }
        if let Some(before_image) = patch.before_image {
            self.before_image = Some(before_image);
        }
        if let Some(after_image) = patch.after_image {
            self.after_image = Some(after_image);
        }
        if let Some(hours) = patch.estimated_hours {
            self.estimated_hours = Some(hours);
        }
        if let Some(hours) = patch.actual_hours {
            self.actual_hours = Some(hours);
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(status) = patch.status {
            self.transition_to(status, at)?;
        }
        self.updated_at = at;
        self.validate()
    }
}

/// Partial update of a [`Job`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub topic_id: Option<TopicId>,
    pub room_id: Option<RoomId>,
    pub property_id: Option<PropertyId>,
    pub status: Option<JobStatus>,
    pub before_image: Option<String>,
    pub after_image: Option<String>,
    pub estimated_hours: Option<i64>,
    pub actual_hours: Option<i64>,
    pub priority: Option<Priority>,
}

impl JobPatch {
    /// A patch that only changes the status.
    #[must_use]
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Whether anything besides `status` is set.
    #[must_use]
    pub fn touches_details(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.topic_id.is_some()
            || self.room_id.is_some()
            || self.property_id.is_some()
            || self.before_image.is_some()
            || self.after_image.is_some()
            || self.estimated_hours.is_some()
            || self.actual_hours.is_some()
            || self.priority.is_some()
    }
}

/// Criteria for listing jobs. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub property_id: Option<PropertyId>,
    pub room_id: Option<RoomId>,
    pub topic_id: Option<TopicId>,
    pub created_by_id: Option<UserId>,
    /// Only jobs this user holds an active assignment on.
    pub assigned_user_id: Option<UserId>,
}

impl JobFilter {
    /// Whether `job` matches every criterion except `assigned_user_id`,
    /// which needs the assignment table.
    #[must_use]
    pub fn matches_fields(&self, job: &Job) -> bool {
        self.status.is_none_or(|status| job.status == status)
            && self.property_id.is_none_or(|id| job.property_id == id)
            && self.room_id.is_none_or(|id| job.room_id == Some(id))
            && self.topic_id.is_none_or(|id| job.topic_id == Some(id))
            && self.created_by_id.is_none_or(|id| job.created_by_id == id)
    }
}

/// Step-by-step builder for [`Job`].
#[derive(Debug, Default)]
pub struct JobBuilder {
    id: Option<JobId>,
    title: Option<String>,
    description: Option<String>,
    topic_id: Option<TopicId>,
    room_id: Option<RoomId>,
    property_id: Option<PropertyId>,
    status: Option<JobStatus>,
    created_by_id: Option<UserId>,
    before_image: Option<String>,
    after_image: Option<String>,
    estimated_hours: Option<i64>,
    actual_hours: Option<i64>,
    priority: Option<Priority>,
}

impl JobBuilder {
    #[must_use]
    pub fn id(mut self, id: JobId) -> Self {
        self.id = Some(id);
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
    pub fn topic_id(mut self, topic_id: Option<TopicId>) -> Self {
        self.topic_id = topic_id;
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: Option<RoomId>) -> Self {
        self.room_id = room_id;
        self
    }

    #[must_use]
    pub fn property_id(mut self, property_id: PropertyId) -> Self {
        self.property_id = Some(property_id);
        self
    }

    #[must_use]
    pub fn status(mut self, status: JobStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn created_by_id(mut self, created_by_id: UserId) -> Self {
        self.created_by_id = Some(created_by_id);
        self
    }

    #[must_use]
    pub fn before_image(mut self, before_image: Option<String>) -> Self {
        self.before_image = before_image;
        self
    }

    #[must_use]
    pub fn after_image(mut self, after_image: Option<String>) -> Self {
        self.after_image = after_image;
        self
    }

    #[must_use]
    pub fn estimated_hours(mut self, hours: Option<i64>) -> Self {
        self.estimated_hours = hours;
        self
    }

    #[must_use]
    pub fn actual_hours(mut self, hours: Option<i64>) -> Self {
        self.actual_hours = hours;
        self
    }

    #[must_use]
    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Consume the builder, validate, and return a [`Job`].
    ///
    /// A job created directly in `IN_PROGRESS` or `COMPLETED` gets the
    /// matching timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `property_id` or
    /// `created_by_id` is missing, or a field is invalid.
    pub fn build(self) -> Result<Job, PmTrackError> {
        let property_id = self
            .property_id
            .ok_or(ValidationError::MissingField("property_id"))?;
        let created_by_id = self
            .created_by_id
            .ok_or(ValidationError::MissingField("created_by_id"))?;
        let created_at = now();
        let status = self.status.unwrap_or_default();
        let job = Job {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description,
            topic_id: self.topic_id,
            room_id: self.room_id,
            property_id,
            status,
            created_by_id,
            before_image: self.before_image,
            after_image: self.after_image,
            estimated_hours: self.estimated_hours,
            actual_hours: self.actual_hours,
            priority: self.priority.unwrap_or_default(),
            started_at: (status == JobStatus::InProgress).then_some(created_at),
            completed_at: (status == JobStatus::Completed).then_some(created_at),
            created_at,
            updated_at: created_at,
        };
        job.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn job() -> Job {
        Job::builder()
            .title("Replace filter")
            .property_id(PropertyId::new())
            .created_by_id(UserId::new())
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_pending_medium_job() {
        let job = job();
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.priority, Priority::Medium);
        assert!(job.started_at.is_none());
        assert!(job.completed_at.is_none());
    }

    #[test]
    fn should_require_property_and_creator() {
        assert!(matches!(
            Job::builder().title("x").created_by_id(UserId::new()).build(),
            Err(PmTrackError::Validation(ValidationError::MissingField(
                "property_id"
            )))
        ));
        assert!(matches!(
            Job::builder().title("x").property_id(PropertyId::new()).build(),
            Err(PmTrackError::Validation(ValidationError::MissingField(
                "created_by_id"
            )))
        ));
    }

    #[test]
    fn should_reject_negative_hours() {
        let result = Job::builder()
            .title("x")
            .property_id(PropertyId::new())
            .created_by_id(UserId::new())
            .estimated_hours(Some(-2))
            .build();
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::Negative(
                "estimated_hours"
            )))
        ));
    }

    #[test]
    fn should_follow_transition_table() {
        use JobStatus::{Assigned, Cancelled, Completed, InProgress, OnHold, Pending};

        assert!(Pending.can_transition_to(Assigned));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));
        assert!(Assigned.can_transition_to(Pending));
        assert!(!Assigned.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Assigned));
        assert!(OnHold.can_transition_to(InProgress));
        assert!(!OnHold.can_transition_to(Completed));
        for next in JobStatus::ALL {
            assert_eq!(Completed.can_transition_to(*next), *next == Completed);
            assert_eq!(Cancelled.can_transition_to(*next), *next == Cancelled);
        }
    }

    #[test]
    fn should_stamp_started_and_completed_once() {
        let mut job = job();
        let t0 = now();
        job.transition_to(JobStatus::InProgress, t0).unwrap();
        assert_eq!(job.started_at, Some(t0));

        job.transition_to(JobStatus::OnHold, t0 + Duration::minutes(5))
            .unwrap();
        job.transition_to(JobStatus::InProgress, t0 + Duration::minutes(10))
            .unwrap();
        assert_eq!(job.started_at, Some(t0));

        let t1 = t0 + Duration::hours(1);
        job.transition_to(JobStatus::Completed, t1).unwrap();
        assert_eq!(job.completed_at, Some(t1));
        assert!(job.status.is_terminal());
    }

    #[test]
    fn should_treat_same_status_as_noop() {
        let mut job = job();
        let before = job.updated_at;
        job.transition_to(JobStatus::Pending, before + Duration::hours(1))
            .unwrap();
        assert_eq!(job.updated_at, before);
    }

    #[test]
    fn should_reject_leaving_terminal_state() {
        let mut job = job();
        job.transition_to(JobStatus::Cancelled, now()).unwrap();
        let err = job.transition_to(JobStatus::Pending, now()).unwrap_err();
        assert!(matches!(
            err,
            PmTrackError::Validation(ValidationError::InvalidJobTransition {
                from: JobStatus::Cancelled,
                to: JobStatus::Pending,
            })
        ));
    }

    #[test]
    fn should_stamp_started_at_when_created_in_progress() {
        let job = Job::builder()
            .title("Urgent leak")
            .property_id(PropertyId::new())
            .created_by_id(UserId::new())
            .status(JobStatus::InProgress)
            .build()
            .unwrap();
        assert!(job.started_at.is_some());
    }

    #[test]
    fn should_detect_status_only_patch() {
        assert!(!JobPatch::status(JobStatus::OnHold).touches_details());
        assert!(
            JobPatch {
                title: Some("new".to_string()),
                ..JobPatch::default()
            }
            .touches_details()
        );
    }

    #[test]
    fn should_match_filter_fields() {
        let job = job();
        let filter = JobFilter {
            property_id: Some(job.property_id),
            status: Some(JobStatus::Pending),
            ..JobFilter::default()
        };
        assert!(filter.matches_fields(&job));
        let other = JobFilter {
            room_id: Some(RoomId::new()),
            ..JobFilter::default()
        };
        assert!(!other.matches_fields(&job));
    }
}
