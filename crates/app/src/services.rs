//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.
//! Every use-case that acts on behalf of a user takes the calling
//! [`Actor`](pmtrack_domain::access::Actor) and checks its permissions first.

pub mod auth_service;
pub mod facility_service;
pub mod inspection_service;
pub mod issue_service;
pub mod job_service;
pub mod maintenance_service;
pub mod topic_service;
pub mod user_service;
pub mod work_order_service;
