//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod auth;
pub mod storage;

pub use auth::{PasswordHasher, TokenBlacklist, TokenCodec};
pub use storage::{
    AssignmentRepository, InspectionRepository, IssueRepository, JobRepository,
    MachineRepository, PmExecutionRepository, PmScheduleRepository, ProcedureRepository,
    PropertyRepository, RoomRepository, TopicRepository, UserRepository, WorkOrderRepository,
};

/// One concrete adapter per port, chosen once by the composition root.
///
/// Inbound adapters are generic over a single `P: Ports` instead of one type
/// parameter per repository.
pub trait Ports: Send + Sync + 'static {
    type Users: UserRepository + Send + Sync + 'static;
    type Properties: PropertyRepository + Send + Sync + 'static;
    type Rooms: RoomRepository + Send + Sync + 'static;
    type Machines: MachineRepository + Send + Sync + 'static;
    type Topics: TopicRepository + Send + Sync + 'static;
    type Jobs: JobRepository + Send + Sync + 'static;
    type Assignments: AssignmentRepository + Send + Sync + 'static;
    type WorkOrders: WorkOrderRepository + Send + Sync + 'static;
    type Inspections: InspectionRepository + Send + Sync + 'static;
    type Procedures: ProcedureRepository + Send + Sync + 'static;
    type PmSchedules: PmScheduleRepository + Send + Sync + 'static;
    type PmExecutions: PmExecutionRepository + Send + Sync + 'static;
    type Issues: IssueRepository + Send + Sync + 'static;
    type Hasher: PasswordHasher + Send + Sync + 'static;
    type Tokens: TokenCodec + Send + Sync + 'static;
    type Blacklist: TokenBlacklist + Send + Sync + 'static;
}
