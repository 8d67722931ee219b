//! Job assignment: links a user to a job with a role.
//!
//! Assignments are never deleted; removing one clears `is_active` so the
//! rows double as the job's assignment history.

use serde::{Deserialize, Serialize};

use crate::error::PmTrackError;
use crate::id::{AssignmentId, JobId, UserId};
use crate::time::{Timestamp, now};
use crate::validate;

/// Membership of a user in a [`Job`](crate::job::Job).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobUserAssignment {
    pub id: AssignmentId,
    pub job_id: JobId,
    pub user_id: UserId,
    pub assigned_by_id: UserId,
    pub role_in_job: String,
    pub notes: Option<String>,
    pub is_active: bool,
    pub assigned_at: Timestamp,
}

impl JobUserAssignment {
    pub const DEFAULT_ROLE: &'static str = "ASSIGNEE";
    pub const ROLE_MAX: usize = 50;

    /// Create an active assignment.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `role_in_job` is empty or
    /// too long.
    pub fn new(
        job_id: JobId,
        user_id: UserId,
        assigned_by_id: UserId,
        role_in_job: Option<String>,
        notes: Option<String>,
    ) -> Result<Self, PmTrackError> {
        let assignment = Self {
            id: AssignmentId::new(),
            job_id,
            user_id,
            assigned_by_id,
            role_in_job: role_in_job.unwrap_or_else(|| Self::DEFAULT_ROLE.to_string()),
            notes,
            is_active: true,
            assigned_at: now(),
        };
        assignment.validate()?;
        Ok(assignment)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when `role_in_job` is empty or
    /// too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("role_in_job", &self.role_in_job, Self::ROLE_MAX)?;
        Ok(())
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: AssignmentPatch) -> Result<(), PmTrackError> {
        if let Some(role_in_job) = patch.role_in_job {
            self.role_in_job = role_in_job;
        }
        if let Some(notes) = patch.notes {
            self.notes = Some(notes);
        }
        if let Some(is_active) = patch.is_active {
            self.is_active = is_active;
        }
        self.validate()
    }
}

/// Partial update of a [`JobUserAssignment`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentPatch {
    pub role_in_job: Option<String>,
    pub notes: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn should_default_role_to_assignee() {
        let assignment =
            JobUserAssignment::new(JobId::new(), UserId::new(), UserId::new(), None, None)
                .unwrap();
        assert_eq!(assignment.role_in_job, "ASSIGNEE");
        assert!(assignment.is_active);
    }

    #[test]
    fn should_reject_overlong_role() {
        let result = JobUserAssignment::new(
            JobId::new(),
            UserId::new(),
            UserId::new(),
            Some("R".repeat(51)),
            None,
        );
        assert!(matches!(
            result,
            Err(PmTrackError::Validation(ValidationError::TooLong {
                field: "role_in_job",
                max: 50
            }))
        ));
    }

    #[test]
    fn should_deactivate_through_patch() {
        let mut assignment = JobUserAssignment::new(
            JobId::new(),
            UserId::new(),
            UserId::new(),
            Some("LEAD".to_string()),
            None,
        )
        .unwrap();
        assignment
            .apply(AssignmentPatch {
                is_active: Some(false),
                ..AssignmentPatch::default()
            })
            .unwrap();
        assert!(!assignment.is_active);
        assert_eq!(assignment.role_in_job, "LEAD");
    }
}
