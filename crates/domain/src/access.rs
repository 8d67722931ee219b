//! Role-based access control.
//!
//! Each [`Permission`] is held by a minimum [`UserRole`]; higher roles inherit
//! everything below them. An [`Actor`] is the authenticated caller that
//! services check permissions against.

use serde::Serialize;

use crate::error::{ForbiddenError, PmTrackError};
use crate::id::UserId;
use crate::user::{User, UserRole};

string_enum! {
    /// A capability guarded by the access policy.
    Permission {
        ViewRecords => "records:view",
        RecordInspections => "inspections:record",
        /// Log PM executions, report issues and move them along.
        RecordMaintenance => "maintenance:record",
        /// Change the status of a job the caller is assigned to.
        UpdateJobProgress => "jobs:progress",
        /// Create, update and delete any job.
        ManageJobs => "jobs:manage",
        AssignJobs => "jobs:assign",
        ManageWorkOrders => "work_orders:manage",
        /// PM schedules and issue triage.
        ManageMaintenance => "maintenance:manage",
        /// Properties, rooms, machines and topics.
        ManageFacilities => "facilities:manage",
        ViewStatistics => "statistics:view",
        ManageUsers => "users:manage",
    }
}

impl Permission {
    /// The least privileged role holding this permission.
    #[must_use]
    pub fn minimum_role(self) -> UserRole {
        match self {
            Self::ViewRecords
            | Self::RecordInspections
            | Self::RecordMaintenance
            | Self::UpdateJobProgress => UserRole::Technician,
            Self::ManageJobs
            | Self::AssignJobs
            | Self::ManageWorkOrders
            | Self::ManageMaintenance => UserRole::Supervisor,
            Self::ManageFacilities | Self::ViewStatistics => UserRole::Manager,
            Self::ManageUsers => UserRole::Admin,
        }
    }
}

impl UserRole {
    /// Whether this role holds `permission`.
    #[must_use]
    pub fn grants(self, permission: Permission) -> bool {
        self >= permission.minimum_role()
    }

    /// Permissions held by this role.
    #[must_use]
    pub fn permissions(self) -> Vec<Permission> {
        Permission::ALL
            .iter()
            .copied()
            .filter(|permission| self.grants(*permission))
            .collect()
    }
}

/// The authenticated caller of a use-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
    pub role: UserRole,
}

impl Actor {
    #[must_use]
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    #[must_use]
    pub fn can(&self, permission: Permission) -> bool {
        self.role.grants(permission)
    }

    /// Require `permission`.
    ///
    /// # Errors
    ///
    /// Returns [`PmTrackError::Forbidden`] when the actor's role is too low.
    pub fn authorize(&self, permission: Permission) -> Result<(), PmTrackError> {
        if self.can(permission) {
            Ok(())
        } else {
            Err(ForbiddenError::MissingPermission(permission).into())
        }
    }

    #[must_use]
    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
