//! Firestore-backed user store.
//!
//! Uses a dual-document pattern:
//! - User doc at `users/{id}`
//! - Email index at `user_emails/{email}` enforcing uniqueness
//!
//! Both are written in one commit, and index documents are only ever created
//! with an `exists: false` precondition.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use jobtrack_models::{User, UserId};

use super::client::FirestoreClient;
use super::types::{Document, FieldsExt, Precondition, ToFirestoreValue, Value, Write};
use crate::error::{StoreError, StoreResult};
use crate::store::UserStore;

pub const USERS_COLLECTION: &str = "users";
pub const EMAIL_INDEX_COLLECTION: &str = "user_emails";

/// User store over the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreUserStore {
    client: FirestoreClient,
}

impl FirestoreUserStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }

    /// Document id of an email's index entry. Emails may contain `/`.
    fn email_key(email: &str) -> String {
        urlencoding::encode(email).into_owned()
    }

    fn user_name(&self, id: &UserId) -> String {
        self.client.full_document_name(USERS_COLLECTION, id.as_str())
    }

    fn index_name(&self, email: &str) -> String {
        self.client
            .full_document_name(EMAIL_INDEX_COLLECTION, &Self::email_key(email))
    }

    fn index_write(&self, user: &User) -> Write {
        let mut fields = HashMap::new();
        fields.insert("userId".to_string(), user.id.as_str().to_firestore_value());
        Write::update(
            Document::named(self.index_name(&user.email), fields),
            Some(Precondition::exists(false)),
        )
    }

    fn email_taken(email: &str) -> impl FnOnce(StoreError) -> StoreError + '_ {
        move |e| match e {
            StoreError::AlreadyExists(_) => StoreError::EmailTaken(email.to_string()),
            other => other,
        }
    }
}

#[async_trait]
impl UserStore for FirestoreUserStore {
    async fn insert(&self, user: &User) -> StoreResult<()> {
        let writes = vec![
            Write::update(
                Document::named(self.user_name(&user.id), user_to_fields(user)),
                Some(Precondition::exists(false)),
            ),
            self.index_write(user),
        ];

        self.client
            .commit(writes)
            .await
            .map_err(Self::email_taken(&user.email))?;

        info!(user_id = %user.id, "Created user");
        Ok(())
    }

    async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        match self.client.get_document(USERS_COLLECTION, id.as_str()).await? {
            Some(doc) => Ok(Some(document_to_user(&doc)?)),
            None => Ok(None),
        }
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let Some(index) = self
            .client
            .get_document(EMAIL_INDEX_COLLECTION, &Self::email_key(email))
            .await?
        else {
            return Ok(None);
        };

        let user_id: String = index.fields()?.require("userId")?;
        self.get(&UserId::from(user_id)).await
    }

    async fn update(&self, user: &User) -> StoreResult<()> {
        let doc = self
            .client
            .get_document(USERS_COLLECTION, user.id.as_str())
            .await?
            .ok_or_else(|| StoreError::not_found(format!("No user with id {}", user.id)))?;
        let previous = document_to_user(&doc)?;

        let precondition = match doc.update_time {
            Some(ts) => Precondition::updated_at(ts),
            None => Precondition::exists(true),
        };
        let mut writes = vec![Write::update(
            Document::named(self.user_name(&user.id), user_to_fields(user)),
            Some(precondition),
        )];

        if previous.email != user.email {
            writes.push(self.index_write(user));
            writes.push(Write::delete(self.index_name(&previous.email), None));
        }

        self.client
            .commit(writes)
            .await
            .map_err(Self::email_taken(&user.email))?;

        info!(user_id = %user.id, "Updated user");
        Ok(())
    }
}

// ============================================================================
// Field Conversion Helpers
// ============================================================================

fn user_to_fields(user: &User) -> HashMap<String, Value> {
    let mut fields = HashMap::new();
    fields.insert("name".to_string(), user.name.to_firestore_value());
    fields.insert("email".to_string(), user.email.to_firestore_value());
    fields.insert("passwordHash".to_string(), user.password_hash.to_firestore_value());
    fields.insert("lastName".to_string(), user.last_name.to_firestore_value());
    fields.insert("location".to_string(), user.location.to_firestore_value());
    fields.insert("createdAt".to_string(), user.created_at.to_firestore_value());
    fields.insert("updatedAt".to_string(), user.updated_at.to_firestore_value());
    fields
}

fn document_to_user(doc: &Document) -> StoreResult<User> {
    let fields = doc.fields()?;
    let id = doc
        .id()
        .ok_or_else(|| StoreError::InvalidResponse("User document has no name".to_string()))?;
    let created_at = fields.require("createdAt")?;

    Ok(User {
        id: UserId::from(id),
        name: fields.require("name")?,
        email: fields.require("email")?,
        password_hash: fields.require("passwordHash")?,
        last_name: fields.get_as("lastName"),
        location: fields.get_as("location"),
        created_at,
        updated_at: fields.get_as("updatedAt").unwrap_or(created_at),
    })
}
