//! # pmtrack-domain
//!
//! Pure domain model for the pmtrack preventive-maintenance tracker.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps, paging
//! - Define **Users** and their ordered **roles**
//! - Define the facility tree: **Properties** → **Rooms** → **Machines**
//! - Define **Jobs** with their status lifecycle and **job assignments**
//! - Define **Work orders** and **Inspections** with their summary statistics
//! - Define PM **procedures**, recurring **PM schedules** with their executions,
//!   and reported **issues**
//! - Define the role-based **access** policy and authenticated **sessions**
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

#[macro_use]
mod macros;
mod validate;

pub mod error;
pub mod id;
pub mod page;
pub mod time;

pub mod access;
pub mod assignment;
pub mod inspection;
pub mod issue;
pub mod job;
pub mod machine;
pub mod pm_schedule;
pub mod priority;
pub mod procedure;
pub mod property;
pub mod room;
pub mod session;
pub mod topic;
pub mod user;
pub mod work_order;
