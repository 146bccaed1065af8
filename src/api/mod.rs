//! # API Module
//!
//! HTTP endpoints of the service, built on [Axum](https://docs.rs/axum).
//!
//! ## Endpoints
//!
//! ### Invocation
//!
//! - [`invoke`] - `POST /invoke`. Runs one module end to end. Called manually or by
//!   the external timer facility when a schedule fires; in the latter case the
//!   payload carries the `scheduleId` and the schedule is re-armed after the run.
//!   Requires `Authorization: Bearer <secret>`.
//!
//! ### Monitoring
//!
//! - [`health`] - `GET /health`. Returns status and version for monitoring systems
//!   and load balancers.
//!
//! ## Errors
//!
//! Failures render as `{"message": ..., "error": ...}` with the status code of the
//! [`crate::error::Error`] variant: 400 for malformed payloads, 401 for a missing or
//! wrong secret, 404 for unknown modules or schedules, 502 for unrecoverable
//! provider failures and 503 when the timer facility is unavailable.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use axum::{Router, routing::{get, post}};
//! use sporlflow::api::{health, invoke};
//!
//! let app = Router::new()
//!     .route("/health", get(health))
//!     .route("/invoke", post(invoke));
//! ```

mod health;
mod invoke;

pub use health::health;
pub use invoke::invoke;
