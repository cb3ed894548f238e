//! Registration, login and profile updates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use jobtrack_models::validation::normalize_email;
use jobtrack_models::{NewUser, ProfileUpdate, User, UserId};
use jobtrack_store::UserStore;

use crate::auth::TokenService;
use crate::error::{ApiError, ApiResult, DUPLICATE_EMAIL_MESSAGE};
use crate::metrics;
use crate::password::PasswordHasher;

const INVALID_CREDENTIALS: &str = "Invalid Credentials.";

/// Login payload. Both fields are required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Public view of an account plus a fresh token.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub email: String,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub name: String,
    pub token: String,
}

/// Account operations over the user store.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    demo_email: Option<String>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        demo_email: Option<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            demo_email: demo_email.map(|e| normalize_email(&e)),
        }
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    fn summary(&self, user: &User) -> ApiResult<UserSummary> {
        Ok(UserSummary {
            email: user.email.clone(),
            last_name: user.last_name.clone(),
            location: user.location.clone(),
            name: user.name.clone(),
            token: self.tokens.issue(user)?,
        })
    }

    /// Create an account. The stored password is always a hash.
    pub async fn register(&self, registration: NewUser) -> ApiResult<UserSummary> {
        registration.check()?;

        let email = normalize_email(&registration.email);
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::bad_request(DUPLICATE_EMAIL_MESSAGE));
        }

        let password_hash = self.hasher.hash(&registration.password).await?;
        let user = User::new(&registration, password_hash);
        self.users.insert(&user).await?;

        metrics::record_user_registered();
        info!(user_id = %user.id, "Registered user");
        self.summary(&user)
    }

    pub async fn login(&self, request: LoginRequest) -> ApiResult<UserSummary> {
        let (Some(email), Some(password)) = (
            request.email.filter(|e| !e.trim().is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ApiError::bad_request("Please provide email and password."));
        };

        let Some(user) = self.users.find_by_email(&normalize_email(&email)).await? else {
            metrics::record_login(false);
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        };

        if !self.hasher.verify(&password, &user.password_hash).await? {
            metrics::record_login(false);
            warn!(user_id = %user.id, "Login with wrong password");
            return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
        }

        metrics::record_login(true);
        self.summary(&user)
    }

    /// Replace name, email, last name and location. Returns a new token.
    pub async fn update_profile(&self, user_id: &UserId, update: ProfileUpdate) -> ApiResult<UserSummary> {
        update.check()?;

        let mut user = self
            .users
            .get(user_id)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Authentication invalid"))?;

        user.apply_profile(&update);
        self.users.update(&user).await?;

        info!(user_id = %user.id, "Updated profile");
        self.summary(&user)
    }

    /// True for the configured demo account.
    pub async fn is_read_only(&self, user_id: &UserId) -> ApiResult<bool> {
        let Some(demo_email) = &self.demo_email else {
            return Ok(false);
        };
        Ok(self
            .users
            .get(user_id)
            .await?
            .is_some_and(|user| &user.email == demo_email))
    }
}
