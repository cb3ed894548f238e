//! Password hashing.

use async_trait::async_trait;

use crate::error::{ApiError, ApiResult};

/// One-way password hashing capability.
#[async_trait]
pub trait PasswordHasher: Send + Sync {
    async fn hash(&self, password: &str) -> ApiResult<String>;

    /// `Ok(false)` on mismatch; `Err` only when the hash cannot be checked.
    async fn verify(&self, password: &str, hash: &str) -> ApiResult<bool>;
}

/// Bcrypt hasher. Work runs on the blocking thread pool.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

#[async_trait]
impl PasswordHasher for BcryptHasher {
    async fn hash(&self, password: &str) -> ApiResult<String> {
        let password = password.to_string();
        let cost = self.cost;

        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))?
            .map_err(|e| ApiError::internal(format!("Password hashing failed: {}", e)))
    }

    async fn verify(&self, password: &str, hash: &str) -> ApiResult<bool> {
        let password = password.to_string();
        let hash = hash.to_string();

        tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("Task join error: {}", e)))?
            .map_err(|e| ApiError::internal(format!("Password verification failed: {}", e)))
    }
}
