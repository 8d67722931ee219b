//! Issue: a fault reported against a machine.

use serde::{Deserialize, Serialize};

use crate::error::{PmTrackError, ValidationError};
use crate::id::{IssueId, MachineId, RoomId, UserId};
use crate::priority::Priority;
use crate::time::{Timestamp, now};
use crate::validate;

string_enum! {
    /// Where an [`Issue`] stands.
    #[derive(Default)]
    IssueStatus {
        #[default]
        Open => "OPEN",
        Assigned => "ASSIGNED",
        InProgress => "IN_PROGRESS",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
    }
}

impl IssueStatus {
    /// Still needs work: `OPEN`, `ASSIGNED` or `IN_PROGRESS`.
    #[must_use]
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    pub id: IssueId,
    pub machine_id: MachineId,
    pub room_id: Option<RoomId>,
    pub reported_by_id: UserId,
    pub assigned_to_id: Option<UserId>,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: IssueStatus,
    pub reported_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Issue {
    pub const TITLE_MAX: usize = 200;

    /// Create a builder for constructing an [`Issue`].
    #[must_use]
    pub fn builder() -> IssueBuilder {
        IssueBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the title is empty or too long.
    pub fn validate(&self) -> Result<(), PmTrackError> {
        validate::required("title", &self.title, Self::TITLE_MAX)?;
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// Change the status. Closing an open issue stamps `resolved_at`;
    /// reopening clears it.
    pub fn set_status(&mut self, status: IssueStatus, at: Timestamp) {
        if status.is_open() {
            self.resolved_at = None;
        } else if self.status.is_open() || self.resolved_at.is_none() {
            self.resolved_at = Some(at);
        }
        self.status = status;
        self.updated_at = at;
    }

    /// Hand the issue to a user and mark it `ASSIGNED`.
    pub fn assign_to(&mut self, user_id: UserId) {
        self.assigned_to_id = Some(user_id);
        self.set_status(IssueStatus::Assigned, now());
    }

    /// Apply a partial update and re-check invariants.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] when the result is invalid.
    pub fn apply(&mut self, patch: IssuePatch) -> Result<(), PmTrackError> {
        let at = now();
        if let Some(room_id) = patch.room_id {
            self.room_id = Some(room_id);
        }
        if let Some(user_id) = patch.assigned_to_id {
            self.assigned_to_id = Some(user_id);
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
        if let Some(status) = patch.status {
            self.set_status(status, at);
        }
        self.updated_at = at;
        self.validate()
    }
}

/// Partial update of an [`Issue`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssuePatch {
    pub room_id: Option<RoomId>,
    pub assigned_to_id: Option<UserId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<IssueStatus>,
}

/// Criteria for listing issues. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub machine_id: Option<MachineId>,
    pub room_id: Option<RoomId>,
    pub reported_by_id: Option<UserId>,
    pub assigned_to_id: Option<UserId>,
    pub status: Option<IssueStatus>,
    pub priority: Option<Priority>,
    pub is_open: Option<bool>,
}

impl IssueFilter {
    #[must_use]
    pub fn matches(&self, issue: &Issue) -> bool {
        self.machine_id.is_none_or(|id| issue.machine_id == id)
            && self.room_id.is_none_or(|id| issue.room_id == Some(id))
            && self.reported_by_id.is_none_or(|id| issue.reported_by_id == id)
            && self
                .assigned_to_id
                .is_none_or(|id| issue.assigned_to_id == Some(id))
            && self.status.is_none_or(|status| issue.status == status)
            && self.priority.is_none_or(|priority| issue.priority == priority)
            && self.is_open.is_none_or(|open| issue.is_open() == open)
    }
}

/// Aggregate figures over every issue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IssueSummary {
    pub total_issues: u64,
    pub open_issues: u64,
    /// Open and `CRITICAL`.
    pub critical_issues: u64,
    /// `RESOLVED` or `CLOSED`.
    pub resolved_issues: u64,
    /// Resolved share of the total, as a percentage.
    pub resolution_rate: f64,
}

impl IssueSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_issues<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        let mut summary = Self {
            total_issues: 0,
            open_issues: 0,
            critical_issues: 0,
            resolved_issues: 0,
            resolution_rate: 0.0,
        };
        for issue in issues {
            summary.total_issues += 1;
            if issue.is_open() {
                summary.open_issues += 1;
                if issue.priority == Priority::Critical {
                    summary.critical_issues += 1;
                }
            } else {
                summary.resolved_issues += 1;
            }
        }
        if summary.total_issues > 0 {
            summary.resolution_rate =
                summary.resolved_issues as f64 / summary.total_issues as f64 * 100.0;
        }
        summary
    }
}

/// Step-by-step builder for [`Issue`].
#[derive(Debug, Default)]
pub struct IssueBuilder {
    machine_id: Option<MachineId>,
    room_id: Option<RoomId>,
    reported_by_id: Option<UserId>,
    assigned_to_id: Option<UserId>,
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    status: Option<IssueStatus>,
    reported_at: Option<Timestamp>,
}

impl IssueBuilder {
    #[must_use]
    pub fn machine_id(mut self, machine_id: MachineId) -> Self {
        self.machine_id = Some(machine_id);
        self
    }

    #[must_use]
    pub fn room_id(mut self, room_id: Option<RoomId>) -> Self {
        self.room_id = room_id;
        self
    }

    #[must_use]
    pub fn reported_by_id(mut self, reported_by_id: UserId) -> Self {
        self.reported_by_id = Some(reported_by_id);
        self
    }

    #[must_use]
    pub fn assigned_to_id(mut self, assigned_to_id: Option<UserId>) -> Self {
        self.assigned_to_id = assigned_to_id;
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
    pub fn status(mut self, status: IssueStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub fn reported_at(mut self, at: Option<Timestamp>) -> Self {
        self.reported_at = at;
        self
    }

    /// Consume the builder, validate, and return an [`Issue`].
    ///
    /// `reported_at` defaults to now.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Validation`] if `machine_id` or
    /// `reported_by_id` is missing, or the title is invalid.
    pub fn build(self) -> Result<Issue, PmTrackError> {
        let machine_id = self
            .machine_id
            .ok_or(ValidationError::MissingField("machine_id"))?;
        let reported_by_id = self
            .reported_by_id
            .ok_or(ValidationError::MissingField("reported_by_id"))?;
        let created_at = now();
        let mut issue = Issue {
            id: IssueId::new(),
            machine_id,
            room_id: self.room_id,
            reported_by_id,
            assigned_to_id: self.assigned_to_id,
            title: self.title.unwrap_or_default(),
            description: self.description,
            priority: self.priority.unwrap_or_default(),
            status: IssueStatus::Open,
            reported_at: self.reported_at.unwrap_or(created_at),
            resolved_at: None,
            created_at,
            updated_at: created_at,
        };
        if let Some(status) = self.status {
            issue.set_status(status, created_at);
        }
        issue.validate()?;
        Ok(issue)
    }
}
