//! Job and user persistence.
//!
//! This crate provides:
//! - Store traits for jobs and users, with in-memory and Firestore backends
//! - Owner-scoped job queries with filtering, sorting and pagination
//! - Status and monthly summaries
//! - The job repository used by request handlers

pub mod aggregate;
pub mod error;
pub mod firestore;
pub mod memory;
pub mod query;
pub mod repository;
pub mod store;

pub use aggregate::DEFAULT_MONTHS_BACK;
pub use error::{StoreError, StoreResult};
pub use firestore::{FirestoreClient, FirestoreConfig, FirestoreJobStore, FirestoreUserStore};
pub use memory::{MemoryJobStore, MemoryUserStore};
pub use query::{JobFilter, JobQuery, JobSort, ListParams, Page};
pub use repository::{JobPage, JobRepository};
pub use store::{JobStore, UserStore};
