//! # pmtrackd: pmtrack daemon
//!
//! Composition root that wires all adapters together.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct repository implementations (adapters) over one `SQLite` pool
//! - Construct application services, injecting repositories via port traits
//! - Create the initial administrator on an empty database
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

pub mod bootstrap;
pub mod config;

use pmtrack_adapter_auth_jwt::{Argon2PasswordHasher, AuthAdapterError, JwtConfig, JwtTokenCodec};
use pmtrack_adapter_http_axum::AppState;
use pmtrack_adapter_storage_sqlite_sqlx::{
    Database, SqliteAssignmentRepository, SqliteInspectionRepository, SqliteIssueRepository,
    SqliteJobRepository, SqliteMachineRepository, SqlitePmExecutionRepository,
    SqlitePmScheduleRepository, SqliteProcedureRepository, SqlitePropertyRepository,
    SqliteRoomRepository, SqliteTokenBlacklist, SqliteTopicRepository, SqliteUserRepository,
    SqliteWorkOrderRepository,
};
use pmtrack_app::ports::Ports;
use pmtrack_app::services::auth_service::AuthService;
use pmtrack_app::services::facility_service::FacilityService;
use pmtrack_app::services::inspection_service::InspectionService;
use pmtrack_app::services::issue_service::IssueService;
use pmtrack_app::services::job_service::JobService;
use pmtrack_app::services::maintenance_service::MaintenanceService;
use pmtrack_app::services::topic_service::TopicService;
use pmtrack_app::services::user_service::UserService;
use pmtrack_app::services::work_order_service::WorkOrderService;
use pmtrack_app::token_blacklist::{FallbackTokenBlacklist, InMemoryTokenBlacklist};

/// Production port bundle: `SQLite` repositories, argon2 and JWT.
pub struct SqlitePorts;

impl Ports for SqlitePorts {
    type Users = SqliteUserRepository;
    type Properties = SqlitePropertyRepository;
    type Rooms = SqliteRoomRepository;
    type Machines = SqliteMachineRepository;
    type Topics = SqliteTopicRepository;
    type Jobs = SqliteJobRepository;
    type Assignments = SqliteAssignmentRepository;
    type WorkOrders = SqliteWorkOrderRepository;
    type Inspections = SqliteInspectionRepository;
    type Procedures = SqliteProcedureRepository;
    type PmSchedules = SqlitePmScheduleRepository;
    type PmExecutions = SqlitePmExecutionRepository;
    type Issues = SqliteIssueRepository;
    type Hasher = Argon2PasswordHasher;
    type Tokens = JwtTokenCodec;
    type Blacklist = FallbackTokenBlacklist<SqliteTokenBlacklist>;
}

/// Build every service over the database's pool.
///
/// # Errors
///
/// Returns [`AuthAdapterError`] when the signing configuration is rejected.
pub fn build_state(db: &Database, jwt: JwtConfig) -> Result<AppState<SqlitePorts>, AuthAdapterError> {
    let pool = db.pool().clone();

    // Repositories
    let user_repo = SqliteUserRepository::new(pool.clone());
    let property_repo = SqlitePropertyRepository::new(pool.clone());
    let room_repo = SqliteRoomRepository::new(pool.clone());
    let machine_repo = SqliteMachineRepository::new(pool.clone());
    let topic_repo = SqliteTopicRepository::new(pool.clone());
    let job_repo = SqliteJobRepository::new(pool.clone());
    let assignment_repo = SqliteAssignmentRepository::new(pool.clone());
    let work_order_repo = SqliteWorkOrderRepository::new(pool.clone());
    let inspection_repo = SqliteInspectionRepository::new(pool.clone());
    let procedure_repo = SqliteProcedureRepository::new(pool.clone());
    let schedule_repo = SqlitePmScheduleRepository::new(pool.clone());
    let execution_repo = SqlitePmExecutionRepository::new(pool.clone());
    let issue_repo = SqliteIssueRepository::new(pool.clone());
    let blacklist = FallbackTokenBlacklist::new(
        SqliteTokenBlacklist::new(pool),
        InMemoryTokenBlacklist::new(),
    );

    let tokens = JwtTokenCodec::new(jwt)?;

    // Services
    Ok(AppState::new(
        AuthService::new(user_repo.clone(), Argon2PasswordHasher, tokens, blacklist),
        UserService::new(user_repo.clone(), Argon2PasswordHasher),
        FacilityService::new(property_repo.clone(), room_repo.clone(), machine_repo.clone()),
        TopicService::new(topic_repo.clone()),
        JobService::new(
            job_repo,
            assignment_repo,
            user_repo.clone(),
            property_repo,
            room_repo,
            topic_repo.clone(),
        ),
        WorkOrderService::new(work_order_repo, machine_repo.clone(), user_repo.clone()),
        InspectionService::new(inspection_repo, machine_repo.clone(), user_repo.clone()),
        MaintenanceService::new(
            procedure_repo,
            schedule_repo,
            execution_repo,
            topic_repo,
            machine_repo.clone(),
            user_repo.clone(),
        ),
        IssueService::new(issue_repo, machine_repo, user_repo),
    ))
}
