//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ModelError, ModelResult};
use crate::validation::{is_present, normalize_email, validate_email};

/// Unique identifier for a user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Generate a new random user ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Stored user record. `password_hash` never holds plaintext.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Normalized (trimmed, lowercase) email; unique across users.
    pub email: String,
    pub password_hash: String,
    pub last_name: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a record from a validated registration and an already-computed hash.
    pub fn new(registration: &NewUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            name: registration.name.trim().to_string(),
            email: normalize_email(&registration.email),
            password_hash,
            last_name: None,
            location: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a validated profile update.
    pub fn apply_profile(&mut self, update: &ProfileUpdate) {
        self.name = update.name.clone().unwrap_or_default().trim().to_string();
        self.email = normalize_email(update.email.as_deref().unwrap_or_default());
        self.last_name = update.last_name.as_ref().map(|v| v.trim().to_string());
        self.location = update.location.as_ref().map(|v| v.trim().to_string());
        self.updated_at = Utc::now();
    }
}

/// Registration payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Please provide password"))]
    pub password: String,
}

impl NewUser {
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Check required fields and field rules.
    pub fn check(&self) -> ModelResult<()> {
        if self.name.trim().is_empty() || self.email.trim().is_empty() || self.password.is_empty() {
            return Err(ModelError::validation("Please provide name, email and password"));
        }
        let trimmed = Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        trimmed.validate()?;
        Ok(())
    }
}

/// Profile update payload. Every field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "validate_email"))]
    pub email: Option<String>,

    #[serde(default)]
    pub last_name: Option<String>,

    #[serde(default)]
    pub location: Option<String>,
}

impl ProfileUpdate {
    pub fn check(&self) -> ModelResult<()> {
        let all_present = is_present(&self.name)
            && is_present(&self.email)
            && is_present(&self.last_name)
            && is_present(&self.location);
        if !all_present {
            return Err(ModelError::validation("Please provide all values"));
        }
        let trimmed = Self {
            name: self.name.as_ref().map(|v| v.trim().to_string()),
            email: self.email.as_ref().map(|v| v.trim().to_string()),
            last_name: self.last_name.clone(),
            location: self.location.clone(),
        };
        trimmed.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_check() {
        assert!(NewUser::new("Alice", "a@x.com", "secret123").check().is_ok());
        assert!(NewUser::new("Al", "a@x.com", "secret123").check().is_err());
        assert!(NewUser::new("Alice", "not-an-email", "secret123").check().is_err());
        assert!(NewUser::new("Alice", "a@x.com", "").check().is_err());
        assert!(NewUser::new("a".repeat(51), "a@x.com", "pw").check().is_err());
    }

    #[test]
    fn test_user_normalizes_email() {
        let user = User::new(&NewUser::new(" Alice ", " A@X.com", "pw"), "hash".into());
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.name, "Alice");
        assert_eq!(user.last_name, None);
    }

    #[test]
    fn test_profile_update_requires_all_values() {
        let partial = ProfileUpdate {
            name: Some("Alice".into()),
            email: Some("a@x.com".into()),
            last_name: Some("Smith".into()),
            location: None,
        };
        assert_eq!(
            partial.check().unwrap_err(),
            ModelError::validation("Please provide all values")
        );
    }

    #[test]
    fn test_apply_profile() {
        let mut user = User::new(&NewUser::new("Alice", "a@x.com", "pw"), "hash".into());
        let update = ProfileUpdate {
            name: Some("Alicia".into()),
            email: Some("Alicia@X.com".into()),
            last_name: Some("Smith".into()),
            location: Some("Lisbon".into()),
        };
        assert!(update.check().is_ok());
        user.apply_profile(&update);
        assert_eq!(user.email, "alicia@x.com");
        assert_eq!(user.location.as_deref(), Some("Lisbon"));
        assert_eq!(user.password_hash, "hash");
    }
}
