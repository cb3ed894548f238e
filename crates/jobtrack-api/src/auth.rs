//! Token issuing and the authenticated-user extractors.

use std::time::Duration;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use jobtrack_models::{User, UserId};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const AUTH_INVALID: &str = "Authentication invalid";

/// Returned when the read-only demo account tries to change anything.
pub const READ_ONLY_MESSAGE: &str = "Test user. Read only!";

/// Token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub name: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

/// Signs and verifies session tokens.
pub trait TokenService: Send + Sync {
    fn issue(&self, user: &User) -> ApiResult<String>;

    fn verify(&self, token: &str) -> ApiResult<Claims>;
}

/// HS256 tokens with a fixed lifetime.
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            lifetime,
        }
    }

    fn sign(&self, claims: &Claims) -> ApiResult<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Token signing failed: {}", e)))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, user: &User) -> ApiResult<String> {
        let iat = Utc::now().timestamp();
        let lifetime = i64::try_from(self.lifetime.as_secs()).unwrap_or(i64::MAX);
        self.sign(&Claims {
            user_id: user.id.to_string(),
            name: user.name.clone(),
            iat,
            exp: iat.saturating_add(lifetime),
        })
    }

    fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Token rejected");
                ApiError::unauthorized(AUTH_INVALID)
            })
    }
}

/// Authenticated caller, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: UserId,
    pub name: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::unauthorized(AUTH_INVALID))?;

        let claims = state.tokens.verify(token)?;

        Ok(AuthUser {
            user_id: UserId::from(claims.user_id),
            name: claims.name,
        })
    }
}

/// Authenticated caller allowed to change data. The demo account is rejected.
#[derive(Debug, Clone)]
pub struct WritableUser(pub AuthUser);

#[axum::async_trait]
impl FromRequestParts<AppState> for WritableUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if state.accounts.is_read_only(&user.user_id).await? {
            return Err(ApiError::bad_request(READ_ONLY_MESSAGE));
        }
        Ok(WritableUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrack_models::NewUser;

    fn user() -> User {
        User::new(&NewUser::new("Alice", "a@x.com", "pw"), "hash".into())
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = JwtTokenService::new("secret", Duration::from_secs(3600));
        let user = user();
        let claims = tokens.verify(&tokens.issue(&user).unwrap()).unwrap();

        assert_eq!(claims.user_id, user.id.to_string());
        assert_eq!(claims.name, "Alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtTokenService::new("one", Duration::from_secs(60))
            .issue(&user())
            .unwrap();
        let err = JwtTokenService::new("two", Duration::from_secs(60))
            .verify(&token)
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = JwtTokenService::new("secret", Duration::from_secs(60));
        let past = Utc::now().timestamp() - 7200;
        let token = tokens
            .sign(&Claims {
                user_id: "u1".into(),
                name: "Alice".into(),
                iat: past,
                exp: past + 60,
            })
            .unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn test_claims_wire_names() {
        let claims = Claims {
            user_id: "u1".into(),
            name: "Alice".into(),
            iat: 1,
            exp: 2,
        };
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value["userId"], "u1");
        assert!(value.get("user_id").is_none());
    }
}
