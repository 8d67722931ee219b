//! Shared application state for axum handlers.

use std::sync::Arc;

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

pub type Auth<P> =
    AuthService<<P as Ports>::Users, <P as Ports>::Hasher, <P as Ports>::Tokens, <P as Ports>::Blacklist>;
pub type Users<P> = UserService<<P as Ports>::Users, <P as Ports>::Hasher>;
pub type Facilities<P> =
    FacilityService<<P as Ports>::Properties, <P as Ports>::Rooms, <P as Ports>::Machines>;
pub type Topics<P> = TopicService<<P as Ports>::Topics>;
pub type Jobs<P> = JobService<
    <P as Ports>::Jobs,
    <P as Ports>::Assignments,
    <P as Ports>::Users,
    <P as Ports>::Properties,
    <P as Ports>::Rooms,
    <P as Ports>::Topics,
>;
pub type WorkOrders<P> =
    WorkOrderService<<P as Ports>::WorkOrders, <P as Ports>::Machines, <P as Ports>::Users>;
pub type Inspections<P> =
    InspectionService<<P as Ports>::Inspections, <P as Ports>::Machines, <P as Ports>::Users>;
pub type Maintenance<P> = MaintenanceService<
    <P as Ports>::Procedures,
    <P as Ports>::PmSchedules,
    <P as Ports>::PmExecutions,
    <P as Ports>::Topics,
    <P as Ports>::Machines,
    <P as Ports>::Users,
>;
pub type Issues<P> =
    IssueService<<P as Ports>::Issues, <P as Ports>::Machines, <P as Ports>::Users>;

/// Application state shared across all axum handlers.
///
/// Generic over a single [`Ports`] bundle so handlers stay statically
/// dispatched. `Clone` is implemented manually so only the `Arc` wrappers
/// are cloned.
pub struct AppState<P: Ports> {
    pub auth: Arc<Auth<P>>,
    pub users: Arc<Users<P>>,
    pub facilities: Arc<Facilities<P>>,
    pub topics: Arc<Topics<P>>,
    pub jobs: Arc<Jobs<P>>,
    pub work_orders: Arc<WorkOrders<P>>,
    pub inspections: Arc<Inspections<P>>,
    pub maintenance: Arc<Maintenance<P>>,
    pub issues: Arc<Issues<P>>,
}

impl<P: Ports> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            auth: Arc::clone(&self.auth),
            users: Arc::clone(&self.users),
            facilities: Arc::clone(&self.facilities),
            topics: Arc::clone(&self.topics),
            jobs: Arc::clone(&self.jobs),
            work_orders: Arc::clone(&self.work_orders),
            inspections: Arc::clone(&self.inspections),
            maintenance: Arc::clone(&self.maintenance),
            issues: Arc::clone(&self.issues),
        }
    }
}

impl<P: Ports> AppState<P> {
    /// Create a new application state from service instances.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        auth: Auth<P>,
        users: Users<P>,
        facilities: Facilities<P>,
        topics: Topics<P>,
        jobs: Jobs<P>,
        work_orders: WorkOrders<P>,
        inspections: Inspections<P>,
        maintenance: Maintenance<P>,
        issues: Issues<P>,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            users: Arc::new(users),
            facilities: Arc::new(facilities),
            topics: Arc::new(topics),
            jobs: Arc::new(jobs),
            work_orders: Arc::new(work_orders),
            inspections: Arc::new(inspections),
            maintenance: Arc::new(maintenance),
            issues: Arc::new(issues),
        }
    }
}
