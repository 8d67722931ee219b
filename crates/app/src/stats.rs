//! System-wide counters for the admin overview.

use pmtrack_domain::inspection::InspectionSummary;
use pmtrack_domain::issue::IssueSummary;
use pmtrack_domain::job::JobStatus;
use pmtrack_domain::pm_schedule::PmSummary;
use pmtrack_domain::user::{User, UserRole};
use pmtrack_domain::work_order::WorkOrderSummary;

use crate::services::facility_service::FacilityInventory;

/// Account counters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub total: u64,
    pub active: u64,
    /// Users per role, deactivated accounts included, every role present.
    pub by_role: Vec<(UserRole, u64)>,
}

impl UserStats {
    #[must_use]
    pub fn from_users(users: &[User]) -> Self {
        Self {
            total: users.len() as u64,
            active: users.iter().filter(|user| user.is_active).count() as u64,
            by_role: count_by_role(users),
        }
    }
}

/// Number of users holding each role, in role order.
#[must_use]
pub fn count_by_role(users: &[User]) -> Vec<(UserRole, u64)> {
    UserRole::ALL
        .iter()
        .map(|role| {
            let count = users.iter().filter(|user| user.role == *role).count();
            (*role, count as u64)
        })
        .collect()
}

/// Facility counters. `active_*` exclude soft-deleted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FacilityStats {
    pub properties: u64,
    pub active_properties: u64,
    pub rooms: u64,
    pub machines: u64,
    pub active_machines: u64,
}

impl From<&FacilityInventory> for FacilityStats {
    fn from(inventory: &FacilityInventory) -> Self {
        let count = |n: usize| n as u64;
        Self {
            properties: count(inventory.properties.len()),
            active_properties: count(inventory.properties.iter().filter(|p| p.is_active).count()),
            rooms: count(inventory.rooms.len()),
            machines: count(inventory.machines.len()),
            active_machines: count(inventory.machines.iter().filter(|m| m.is_active).count()),
        }
    }
}

/// Everything shown on the admin dashboard.
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub users: UserStats,
    pub facilities: FacilityStats,
    pub jobs_by_status: Vec<(JobStatus, u64)>,
    pub work_orders: WorkOrderSummary,
    pub inspections: InspectionSummary,
    pub maintenance: PmSummary,
    pub issues: IssueSummary,
}

impl SystemStats {
    #[must_use]
    pub fn total_jobs(&self) -> u64 {
        self.jobs_by_status.iter().map(|(_, count)| count).sum()
    }
}
