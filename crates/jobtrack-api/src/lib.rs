//! Axum HTTP API server for the job tracker.
//!
//! This crate provides:
//! - Registration, login and profile updates with HS256 session tokens
//! - Owner-scoped job CRUD, listing and statistics
//! - Rate limiting and security headers
//! - Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::AccountService;
pub use state::AppState;
