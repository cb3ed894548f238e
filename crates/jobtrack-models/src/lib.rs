//! Shared data models for the job tracker backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job applications and their status/type enums
//! - User accounts and profile updates
//! - Statistics summaries (status counts, monthly counts)
//! - Field validation shared by the API and the stores

pub mod error;
pub mod job;
pub mod stats;
pub mod user;
pub mod validation;

// Re-export common types
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobChanges, JobFields, JobId, JobStatus, JobType};
pub use stats::{MonthlyCount, StatusCounts, YearMonth};
pub use user::{NewUser, ProfileUpdate, User, UserId};
