//! # pmtrack-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - one repository per record type (users, properties, rooms, machines,
//!     topics, jobs, job assignments, work orders, inspections)
//!   - `PasswordHasher`, `TokenCodec` and `TokenBlacklist` for authentication
//! - Define **driving/inbound ports** as use-case structs:
//!   - `AuthService`: register, login, authenticate, logout, change password
//!   - `UserService`, `FacilityService`, `TopicService`
//!   - `JobService`: job lifecycle and multi-user assignment
//!   - `WorkOrderService`, `InspectionService`
//! - Enforce referential rules and role-based access on every use-case
//! - Provide **in-process infrastructure** (token blacklist) that doesn't need IO
//!
//! ## Dependency rule
//! Depends on `pmtrack-domain` only (plus `tokio::sync` for locking).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
pub mod stats;
pub mod token_blacklist;

#[cfg(test)]
pub(crate) mod testing;
