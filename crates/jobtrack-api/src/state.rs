//! Application state.

use std::sync::Arc;

use tracing::info;

use jobtrack_store::{
    FirestoreClient, FirestoreJobStore, FirestoreUserStore, JobRepository, JobStore, MemoryJobStore,
    MemoryUserStore, UserStore,
};

use crate::auth::{JwtTokenService, TokenService};
use crate::config::{ApiConfig, StoreBackend};
use crate::password::BcryptHasher;
use crate::services::AccountService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: JobRepository,
    pub accounts: AccountService,
    pub tokens: Arc<dyn TokenService>,
}

impl AppState {
    /// Create state for the configured store backend.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        match config.store_backend {
            StoreBackend::Memory => {
                info!("Using in-memory store; data is lost on restart");
                Ok(Self::in_memory(config))
            }
            StoreBackend::Firestore => {
                let client = FirestoreClient::from_env().await?;
                Ok(Self::from_stores(
                    config,
                    Arc::new(FirestoreJobStore::new(client.clone())),
                    Arc::new(FirestoreUserStore::new(client)),
                ))
            }
        }
    }

    pub fn in_memory(config: ApiConfig) -> Self {
        Self::from_stores(
            config,
            Arc::new(MemoryJobStore::new()),
            Arc::new(MemoryUserStore::new()),
        )
    }

    /// Wire services over the given stores.
    pub fn from_stores(config: ApiConfig, jobs: Arc<dyn JobStore>, users: Arc<dyn UserStore>) -> Self {
        let tokens: Arc<dyn TokenService> =
            Arc::new(JwtTokenService::new(&config.jwt_secret, config.jwt_lifetime));
        let accounts = AccountService::new(
            users,
            Arc::new(BcryptHasher::new(config.bcrypt_cost)),
            Arc::clone(&tokens),
            config.demo_user_email.clone(),
        );

        Self {
            config,
            jobs: JobRepository::new(jobs),
            accounts,
            tokens,
        }
    }
}
