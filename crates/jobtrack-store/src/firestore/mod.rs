//! Firestore REST backend.

pub mod client;
pub mod jobs;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;
pub mod users;


pub use client::{FirestoreClient, FirestoreConfig};
pub use jobs::FirestoreJobStore;
pub use users::FirestoreUserStore;
