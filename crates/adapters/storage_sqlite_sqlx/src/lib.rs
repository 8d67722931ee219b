//! # pmtrack-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `pmtrack-app::ports::storage`
//! - Persist revoked bearer tokens behind `pmtrack-app::ports::TokenBlacklist`
//! - Manage `SQLite` connection pool lifecycle and embedded migrations
//! - Map between domain types and database rows
//!
//! ## Dependency rule
//! Depends on `pmtrack-app` (for port traits) and `pmtrack-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod codec;

pub mod assignment_repo;
pub mod error;
pub mod inspection_repo;
pub mod issue_repo;
pub mod job_repo;
pub mod machine_repo;
pub mod pm_execution_repo;
pub mod pm_schedule_repo;
pub mod pool;
pub mod procedure_repo;
pub mod property_repo;
pub mod room_repo;
pub mod token_blacklist;
pub mod topic_repo;
pub mod user_repo;
pub mod work_order_repo;

pub use assignment_repo::SqliteAssignmentRepository;
pub use inspection_repo::SqliteInspectionRepository;
pub use issue_repo::SqliteIssueRepository;
pub use job_repo::SqliteJobRepository;
pub use machine_repo::SqliteMachineRepository;
pub use pm_execution_repo::SqlitePmExecutionRepository;
pub use pm_schedule_repo::SqlitePmScheduleRepository;
pub use pool::{Config, Database};
pub use procedure_repo::SqliteProcedureRepository;
pub use property_repo::SqlitePropertyRepository;
pub use room_repo::SqliteRoomRepository;
pub use token_blacklist::SqliteTokenBlacklist;
pub use topic_repo::SqliteTopicRepository;
pub use user_repo::SqliteUserRepository;
pub use work_order_repo::SqliteWorkOrderRepository;

#[cfg(test)]
pub(crate) mod fixtures;
