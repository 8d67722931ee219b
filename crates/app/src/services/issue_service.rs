//! Issue service: faults reported against machines.

use pmtrack_domain::access::{Actor, Permission};
use pmtrack_domain::error::{NotFoundError, PmTrackError};
use pmtrack_domain::id::{IssueId, UserId};
use pmtrack_domain::issue::{Issue, IssueFilter, IssuePatch, IssueStatus, IssueSummary};
use pmtrack_domain::priority::Priority;
use pmtrack_domain::time::now;

use crate::ports::{IssueRepository, MachineRepository, UserRepository};

/// Application service for issues.
pub struct IssueService<I, M, U> {
    issues: I,
    machines: M,
    users: U,
}

impl<I, M, U> IssueService<I, M, U>
where
    I: IssueRepository,
    M: MachineRepository,
    U: UserRepository,
{
    pub fn new(issues: I, machines: M, users: U) -> Self {
        Self {
            issues,
            machines,
            users,
        }
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_issues(
        &self,
        actor: &Actor,
        filter: &IssueFilter,
    ) -> Result<Vec<Issue>, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.issues.list(filter).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown issue.
    pub async fn get_issue(&self, actor: &Actor, id: IssueId) -> Result<Issue, PmTrackError> {
        actor.authorize(Permission::ViewRecords)?;
        self.find(id).await
    }

    /// Report an issue against an existing machine.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `RecordMaintenance` and
    /// [`PmTrackError::NotFound`] for an unknown machine, reporter or
    /// assignee.
    #[tracing::instrument(skip(self, actor, issue), fields(actor = %actor.username, machine_id = %issue.machine_id, priority = %issue.priority))]
    pub async fn create_issue(&self, actor: &Actor, issue: Issue) -> Result<Issue, PmTrackError> {
        actor.authorize(Permission::RecordMaintenance)?;
        issue.validate()?;
        if self.machines.get_by_id(issue.machine_id).await?.is_none() {
            return Err(NotFoundError {
                entity: "Machine",
                id: issue.machine_id.to_string(),
            }
            .into());
        }
        if issue.reported_by_id != actor.user_id {
            self.check_user(issue.reported_by_id).await?;
        }
        if let Some(assignee) = issue.assigned_to_id {
            self.check_user(assignee).await?;
        }
        let issue = self.issues.create(issue).await?;
        tracing::info!(issue_id = %issue.id, "issue reported");
        Ok(issue)
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown issue or assignee
    /// and [`PmTrackError::Validation`] for an invalid patch.
    #[tracing::instrument(skip(self, actor, patch), fields(actor = %actor.username))]
    pub async fn update_issue(
        &self,
        actor: &Actor,
        id: IssueId,
        patch: IssuePatch,
    ) -> Result<Issue, PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        let mut issue = self.find(id).await?;
        if let Some(assignee) = patch.assigned_to_id {
            self.check_user(assignee).await?;
        }
        issue.apply(patch)?;
        self.issues.update(issue).await
    }

    /// Hand the issue to a user and mark it `ASSIGNED`.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown issue or user.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn assign(
        &self,
        actor: &Actor,
        id: IssueId,
        user_id: UserId,
    ) -> Result<Issue, PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        let mut issue = self.find(id).await?;
        self.check_user(user_id).await?;
        issue.assign_to(user_id);
        self.issues.update(issue).await
    }

    /// # Errors
    ///
    /// Returns [`PmTrackError::NotFound`] for an unknown issue.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn set_status(
        &self,
        actor: &Actor,
        id: IssueId,
        status: IssueStatus,
    ) -> Result<Issue, PmTrackError> {
        actor.authorize(Permission::RecordMaintenance)?;
        let mut issue = self.find(id).await?;
        issue.set_status(status, now());
        self.issues.update(issue).await
    }

    /// Permanently remove an issue.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] without `ManageMaintenance` and
    /// [`PmTrackError::NotFound`] for an unknown issue.
    #[tracing::instrument(skip(self, actor), fields(actor = %actor.username))]
    pub async fn delete_issue(&self, actor: &Actor, id: IssueId) -> Result<(), PmTrackError> {
        actor.authorize(Permission::ManageMaintenance)?;
        self.find(id).await?;
        self.issues.delete(id).await
    }

    /// Issues still waiting on work, most recent first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn open_issues(&self, actor: &Actor) -> Result<Vec<Issue>, PmTrackError> {
        self.list_issues(
            actor,
            &IssueFilter {
                is_open: Some(true),
                ..IssueFilter::default()
            },
        )
        .await
    }

    /// Open issues of `CRITICAL` priority.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn critical_issues(&self, actor: &Actor) -> Result<Vec<Issue>, PmTrackError> {
        self.list_issues(
            actor,
            &IssueFilter {
                is_open: Some(true),
                priority: Some(Priority::Critical),
                ..IssueFilter::default()
            },
        )
        .await
    }

    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn summary(&self, actor: &Actor) -> Result<IssueSummary, PmTrackError> {
        let issues = self.list_issues(actor, &IssueFilter::default()).await?;
        Ok(IssueSummary::from_issues(&issues))
    }

    async fn find(&self, id: IssueId) -> Result<Issue, PmTrackError> {
        self.issues.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Issue",
                id: id.to_string(),
            }
            .into()
        })
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
