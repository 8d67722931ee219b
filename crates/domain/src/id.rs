//! Typed identifier newtypes backed by UUIDs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Access the inner UUID.
            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`User`](crate::user::User).
    UserId
);

define_id!(
    /// Unique identifier for a [`Property`](crate::property::Property).
    PropertyId
);

define_id!(
    /// Unique identifier for a [`Room`](crate::room::Room).
    RoomId
);

define_id!(
    /// Unique identifier for a [`Machine`](crate::machine::Machine).
    MachineId
);

define_id!(
    /// Unique identifier for a [`Topic`](crate::topic::Topic).
    TopicId
);

define_id!(
    /// Unique identifier for a [`Job`](crate::job::Job).
    JobId
);

define_id!(
    /// Unique identifier for a [`JobUserAssignment`](crate::assignment::JobUserAssignment).
    AssignmentId
);

define_id!(
    /// Unique identifier for a [`WorkOrder`](crate::work_order::WorkOrder).
    WorkOrderId
);

define_id!(
    /// Unique identifier for an [`Inspection`](crate::inspection::Inspection).
    InspectionId
);

define_id!(
    /// Unique identifier for a [`Procedure`](crate::procedure::Procedure).
    ProcedureId
);

define_id!(
    /// Unique identifier for a [`PmSchedule`](crate::pm_schedule::PmSchedule).
    PmScheduleId
);

define_id!(
    /// Unique identifier for a [`PmExecution`](crate::pm_schedule::PmExecution).
    PmExecutionId
);

define_id!(
    /// Unique identifier for an [`Issue`](crate::issue::Issue).
    IssueId
);
