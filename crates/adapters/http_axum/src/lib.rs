//! # pmtrack-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve the **JSON REST API** under `/api/v1` (auth, users, facilities,
//!   topics, jobs and assignments, work orders, inspections, admin stats)
//! - Serve a **server-side-rendered admin panel** under `/admin` that works
//!   with **zero JavaScript**: plain HTML forms posting back and redirecting
//!   (PRG pattern), authenticated by an `HttpOnly` session cookie
//! - Optionally serve a prebuilt single-page frontend as the router fallback
//! - Map application errors into HTTP status codes and `{"error": ...}` bodies
//!
//! ## Dependency rule
//! Depends on `pmtrack-app` (for port traits and services) and `pmtrack-domain`
//! (for domain types used in request/response mapping). Never leaks axum types
//! into the domain.

pub mod admin_panel;
pub mod api;
pub mod auth;
pub mod error;
pub mod router;
pub mod state;

pub use router::{RouterConfig, build};
pub use state::AppState;
